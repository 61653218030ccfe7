//! The rename pipeline, driven by user actions.
//!
//! Ordering matters: the entity id is final before the wallet is asked to
//! sign, and the deployment carries exactly the signed id. Any failure
//! leaves the selection untouched so the action can be retried from the
//! same baseline.

use tracing::info;

use namechanger_shared::mutate::apply_name_change;
use namechanger_shared::payload::{build_unsigned_payload, now_millis, DeploymentPayload};
use namechanger_shared::selection::SelectionController;
use namechanger_shared::types::{EntityType, OwnedName};

use crate::catalyst::DeploymentReceipt;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::signer::authorize;

/// Resolve owned names and the published name. Halts before touching the
/// peer when the address owns nothing or the index could not be reached.
pub async fn load_selection(session: &Session) -> Result<SelectionController> {
    let address = session.address();
    let owned = session
        .index()
        .lookup_owned_names(address)
        .await
        .into_result()?;

    if owned.is_empty() {
        return Err(ClientError::NoOwnedNames(address.clone()));
    }

    let profile = session.peer().fetch_profile(address).await?;
    let current = OwnedName::new(profile.current_name()?);

    info!(
        address = %address,
        owned = owned.len(),
        current = %current,
        "Loaded name selection"
    );

    Ok(SelectionController::new(owned, current))
}

/// Fetch the latest profile and build the unsigned entity that renames it.
pub async fn prepare_rename(
    session: &Session,
    name: &OwnedName,
    timestamp: i64,
) -> Result<DeploymentPayload> {
    let address = session.address();
    let profile = session.peer().fetch_profile(address).await?;
    let metadata = apply_name_change(&profile, name)?;

    let payload = build_unsigned_payload(
        EntityType::Profile,
        std::slice::from_ref(address),
        &profile.content,
        &metadata,
        timestamp,
    )?;

    info!(
        entity_id = %payload.entity_id,
        previous = %profile.id,
        name = %name,
        "Built rename entity"
    );

    Ok(payload)
}

/// Sign and deploy the selected name. On success the controller's current
/// name moves to the selection; on any error it is left as it was.
pub async fn deploy_selection(
    session: &Session,
    controller: &mut SelectionController,
) -> Result<DeploymentReceipt> {
    if !controller.can_deploy() {
        return Err(ClientError::NothingToDeploy(controller.current().to_string()));
    }

    let name = controller.selected().clone();
    let payload = prepare_rename(session, &name, now_millis()).await?;
    let chain = authorize(&payload.entity_id, session.address(), session.wallet()).await?;
    let receipt = session.peer().deploy(&payload, &chain).await?;

    controller.confirm_deployed();
    info!(name = %name, entity_id = %receipt.entity_id, "Name changed");

    Ok(receipt)
}
