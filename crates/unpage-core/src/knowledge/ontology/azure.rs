//! Azure resource kinds.
//!
//! Payloads use the snake_case field names of the Azure SDK models
//! (`managed_by`, `disk_size_gb`, ...). Cross-resource links are full ARM ids,
//! which match the `id` identifier of the target as-is.

use super::relationship::{ATTACHED_TO, USES_DISK_ACCESS};
use crate::knowledge::error::KnowledgeError;
use crate::knowledge::payload::Payload;
use crate::knowledge::Reference;

pub(super) fn base_identifiers(payload: &Payload<'_>) -> Vec<Option<String>> {
    vec![payload.string("id"), payload.string("name")]
}

/// Size-qualified names, so alerts that mention `data-disk-128GB` resolve.
pub(super) fn managed_disk_identifiers(
    payload: &Payload<'_>,
) -> Result<Vec<Option<String>>, KnowledgeError> {
    let mut identifiers = Vec::new();

    let (Some(name), Some(size_gb)) = (payload.string("name"), payload.string("disk_size_gb"))
    else {
        return Ok(identifiers);
    };
    // A zero size means the disk reports no size
    if size_gb.parse::<f64>() == Ok(0.0) {
        return Ok(identifiers);
    }

    identifiers.push(Some(format!("{}-{}GB", name, size_gb)));
    if let Some(sku) = payload.object("sku")?.string("name") {
        identifiers.push(Some(format!("{}-{}-{}GB", name, sku, size_gb)));
    }

    Ok(identifiers)
}

pub(super) fn managed_disk_references(payload: &Payload<'_>) -> Vec<Reference> {
    let mut references = Vec::new();

    if let Some(vm) = payload.string("managed_by") {
        references.push(Reference::typed(vm, ATTACHED_TO));
    }
    if let Some(disk_access) = payload.string("disk_access_id") {
        references.push(Reference::typed(disk_access, USES_DISK_ACCESS));
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_managed_disk_synthetic_identifiers() {
        let raw = json!({
            "name": "data-disk",
            "disk_size_gb": 128,
            "sku": {"name": "Premium_LRS", "tier": "Premium"}
        });
        let payload = Payload::new("disk", &raw).unwrap();
        let ids: Vec<String> = managed_disk_identifiers(&payload)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ids, vec!["data-disk-128GB", "data-disk-Premium_LRS-128GB"]);
    }

    #[test]
    fn test_managed_disk_without_size() {
        let raw = json!({"name": "data-disk"});
        let payload = Payload::new("disk", &raw).unwrap();
        assert!(managed_disk_identifiers(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_managed_disk_zero_size() {
        for size in [json!(0), json!(0.0), json!("0")] {
            let raw = json!({"name": "data-disk", "disk_size_gb": size, "sku": {"name": "Premium_LRS"}});
            let payload = Payload::new("disk", &raw).unwrap();
            assert!(managed_disk_identifiers(&payload).unwrap().is_empty());
        }
    }

    #[test]
    fn test_managed_disk_references() {
        let vm = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1";
        let raw = json!({"managed_by": vm, "disk_access_id": "/subscriptions/s/diskAccesses/da-1"});
        let payload = Payload::new("disk", &raw).unwrap();
        assert_eq!(
            managed_disk_references(&payload),
            vec![
                Reference::typed(vm, ATTACHED_TO),
                Reference::typed("/subscriptions/s/diskAccesses/da-1", USES_DISK_ACCESS),
            ]
        );
    }
}
