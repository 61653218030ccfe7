use crate::entity::{ProfileEntity, ProfileMetadata};
use crate::error::Result;
use crate::types::OwnedName;

/// Return a copy of the profile's metadata with the primary avatar renamed
/// to `new_name` and marked as a claimed name. The profile itself, its
/// content map and every other avatar field are left untouched.
pub fn apply_name_change(profile: &ProfileEntity, new_name: &OwnedName) -> Result<ProfileMetadata> {
    let mut metadata = profile.metadata.clone();
    let avatar = metadata.primary_avatar_mut()?;
    avatar.name = new_name.as_str().to_string();
    avatar.has_claimed_name = Some(true);
    Ok(metadata)
}
