//! Conversion of raw binding records into domain objects.

use crate::error::{CmisError, Result};
use crate::models::{
    BaseTypeId, ChangeEvent, CmisObject, ObjectData, ObjectInFolderContainer, OperationContext,
    PropertyIds, QueryResult, Tree,
};

/// Turns [`ObjectData`] returned by the binding into domain records.
pub trait ObjectFactory: Send + Sync {
    fn convert_object(&self, data: &ObjectData, context: &OperationContext) -> Result<CmisObject>;

    fn convert_query_result(&self, data: &ObjectData) -> Result<QueryResult>;

    fn convert_change_event(&self, data: &ObjectData) -> Result<ChangeEvent>;

    /// Convert a descendants or folder-tree listing.
    fn convert_tree(
        &self,
        containers: &[ObjectInFolderContainer],
        context: &OperationContext,
    ) -> Result<Vec<Tree<CmisObject>>> {
        containers
            .iter()
            .map(|container| {
                Ok(Tree {
                    item: self.convert_object(&container.object.object, context)?,
                    children: self.convert_tree(&container.children, context)?,
                })
            })
            .collect()
    }
}

/// Factory reading identity and type from the standard CMIS properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultObjectFactory;

fn required_string<'a>(data: &'a ObjectData, property: &str) -> Result<&'a str> {
    data.properties
        .get(property)
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CmisError::runtime(format!("Object data has no '{}' property", property)))
}

impl ObjectFactory for DefaultObjectFactory {
    fn convert_object(&self, data: &ObjectData, _context: &OperationContext) -> Result<CmisObject> {
        let id = required_string(data, PropertyIds::OBJECT_ID)?;
        let base = required_string(data, PropertyIds::BASE_TYPE_ID)?;
        let base_type_id = BaseTypeId::parse(base)
            .ok_or_else(|| CmisError::runtime(format!("Unknown base type '{}'", base)))?;
        let object_type_id = data
            .properties
            .get(PropertyIds::OBJECT_TYPE_ID)
            .and_then(|value| value.as_str())
            .unwrap_or(base_type_id.as_str());

        let mut object = CmisObject::new(id, base_type_id, object_type_id);
        for (property, value) in &data.properties {
            object = object.with_property(property.clone(), value.clone());
        }
        Ok(object)
    }

    fn convert_query_result(&self, data: &ObjectData) -> Result<QueryResult> {
        Ok(QueryResult {
            properties: data.properties.clone(),
        })
    }

    fn convert_change_event(&self, data: &ObjectData) -> Result<ChangeEvent> {
        let object_id = required_string(data, PropertyIds::OBJECT_ID)?;
        let info = data
            .change_event_info
            .as_ref()
            .ok_or_else(|| CmisError::runtime("Change entry has no change event info"))?;
        Ok(ChangeEvent {
            object_id: object_id.to_string(),
            change_type: info.change_type,
            change_time: info.change_time,
            properties: data.properties.clone(),
        })
    }
}
