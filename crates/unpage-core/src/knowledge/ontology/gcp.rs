//! Google Cloud resource kinds.
//!
//! Payloads follow the Compute / Cloud SQL REST representations. Cross-resource
//! links are full resource URLs; references keep only the last path segment,
//! which matches the `name` identifier of the target.

use super::relationship::{ATTACHED_TO, FORWARDS_TO, HAS_DISK, ROUTES_TO};
use crate::knowledge::error::KnowledgeError;
use crate::knowledge::payload::{last_segment, Payload};
use crate::knowledge::Reference;

pub(super) fn base_identifiers(payload: &Payload<'_>) -> Vec<Option<String>> {
    vec![payload.string("selfLink")]
}

/// Disks, buckets and backend services are known by id and name.
pub(super) fn named_resource_identifiers(payload: &Payload<'_>) -> Vec<Option<String>> {
    vec![payload.string("id"), payload.string("name")]
}

pub(super) fn compute_instance_identifiers(
    payload: &Payload<'_>,
) -> Result<Vec<Option<String>>, KnowledgeError> {
    let mut identifiers = named_resource_identifiers(payload);

    let interfaces = payload.objects("networkInterfaces")?;
    identifiers.extend(interfaces.iter().map(|nic| nic.string("networkIP")));
    for nic in &interfaces {
        identifiers.extend(nic.objects("accessConfigs")?.iter().map(|c| c.string("natIP")));
    }

    Ok(identifiers)
}

pub(super) fn compute_instance_references(
    payload: &Payload<'_>,
) -> Result<Vec<Reference>, KnowledgeError> {
    Ok(payload
        .objects("disks")?
        .iter()
        .filter_map(|disk| disk.string("source"))
        .map(|source| Reference::typed(last_segment(&source), HAS_DISK))
        .collect())
}

pub(super) fn persistent_disk_references(
    payload: &Payload<'_>,
) -> Result<Vec<Reference>, KnowledgeError> {
    Ok(payload
        .strings("users")?
        .into_iter()
        .map(|user| Reference::typed(last_segment(user), ATTACHED_TO))
        .collect())
}

pub(super) fn sql_instance_identifiers(
    payload: &Payload<'_>,
) -> Result<Vec<Option<String>>, KnowledgeError> {
    let mut identifiers = vec![payload.string("name"), payload.string("connectionName")];
    identifiers.extend(
        payload
            .objects("ipAddresses")?
            .iter()
            .map(|mapping| mapping.string("ipAddress")),
    );
    Ok(identifiers)
}

pub(super) fn forwarding_rule_identifiers(payload: &Payload<'_>) -> Vec<Option<String>> {
    let mut identifiers = named_resource_identifiers(payload);
    identifiers.push(payload.string("IPAddress"));
    identifiers
}

pub(super) fn forwarding_rule_references(payload: &Payload<'_>) -> Vec<Reference> {
    let mut references = Vec::new();

    // Target proxy or target pool
    if let Some(target) = payload.string("target") {
        references.push(Reference::typed(last_segment(&target), FORWARDS_TO));
    }

    // Regional rules point straight at a backend service
    if let Some(backend) = payload.string("backendService") {
        references.push(Reference::typed(last_segment(&backend), ROUTES_TO));
    }

    references
}

pub(super) fn backend_service_references(
    payload: &Payload<'_>,
) -> Result<Vec<Reference>, KnowledgeError> {
    Ok(payload
        .objects("backends")?
        .iter()
        .filter_map(|backend| backend.string("group"))
        .map(|group| Reference::typed(last_segment(&group), ROUTES_TO))
        .collect())
}
