use crate::domain::ProjectId;
use crate::domain::auth::Identity;
use crate::domain::membership;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

/// Failures produced by the access gate guarding every project-scoped operation
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("the caller is not logged in")]
    Unauthenticated,

    #[error("the caller is not a member of project {0}")]
    NotAMember(ProjectId),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Resolves the caller's username, failing when the request is anonymous.
pub fn require_authenticated(identity: &Identity) -> Result<&str, AccessError> {
    identity.username().ok_or(AccessError::Unauthenticated)
}

/// Confirms the caller belongs to the project. Membership is the only
/// authorization fact in the system and is re-derived from the store on every
/// call, so a just-removed member can't keep mutating a project through a
/// cached role.
pub async fn require_membership(
    username: &str,
    project_id: ProjectId,
    ext_cxn: &mut impl ExternalConnectivity,
    m_read: &impl membership::driven_ports::MembershipReader,
) -> Result<(), AccessError> {
    let is_member = m_read
        .is_member(username, project_id, ext_cxn)
        .await
        .context("Checking project membership at the access gate")?;

    if is_member {
        Ok(())
    } else {
        Err(AccessError::NotAMember(project_id))
    }
}
