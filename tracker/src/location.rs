use crate::auth::check_institution;
use crate::errors::ApiError;
use crate::model::{INSTITUTION_ID, Member, Reader, member, reader};
use crate::request::{parse_body, parse_timestamp, required_fields};
use crate::state::AppState;
use docstore::{FieldValue, Filter, Patch};
use http::HeaderMap;

const REQUIRED_FIELDS: [&str; 5] = [
    "uid",
    "mac_address",
    "entry_time",
    "api_key",
    "institution_id",
];

/// Occupancy after a scan. A scan in a different room is always an entry; a repeat scan in
/// the same room flips the flag.
pub fn next_in_room(
    reader_location: Option<&str>,
    member_location: Option<&str>,
    in_room: bool,
) -> bool {
    if reader_location != member_location {
        true
    } else {
        !in_room
    }
}

/// Records a tag scan: resolves the member and the reader within the institution, then
/// writes the new room, occupancy flag and entry time onto the member.
///
/// The read and the write are separate store calls, so two scans of the same member racing
/// each other may both compute their toggle from the same prior state.
pub async fn update_user_location(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<&'static str, ApiError> {
    state.auth.check(headers)?;

    let body = parse_body(body)?;
    let [uid, mac_address, entry_time, api_key, institution_id] =
        required_fields(&body, REQUIRED_FIELDS)?;
    let entry_time = parse_timestamp("entry_time", entry_time)?;

    check_institution(
        state.store.as_ref(),
        &state.collections.institution_keys,
        institution_id,
        api_key,
    )
    .await?;

    let member: Member = state
        .store
        .find_one(
            &state.collections.members,
            &[
                Filter::eq(INSTITUTION_ID, institution_id),
                Filter::eq(member::RFID_UID, uid),
            ],
            &[member::RFID_LOCATION, member::IN_ROOM],
        )
        .await?
        .ok_or(ApiError::UnknownTag)?
        .into();

    let reader: Reader = state
        .store
        .find_one(
            &state.collections.readers,
            &[
                Filter::eq(INSTITUTION_ID, institution_id),
                Filter::eq(reader::MAC_ADDRESS, mac_address),
            ],
            &[reader::LOCATION],
        )
        .await?
        .ok_or(ApiError::UnknownReader)?
        .into();

    let in_room = next_in_room(
        reader.location.as_deref(),
        member.rfid_location.as_deref(),
        member.in_room,
    );

    let patch = Patch::from([
        (
            member::RFID_LOCATION.to_string(),
            FieldValue::from(reader.location.clone()),
        ),
        (member::IN_ROOM.to_string(), FieldValue::Bool(in_room)),
        (
            member::LAST_LOCATION_ENTRY.to_string(),
            FieldValue::Timestamp(entry_time),
        ),
    ]);

    // Scoped by institution as well as id so a write can never cross institutions
    let updated = state
        .store
        .update_where(
            &state.collections.members,
            &[
                Filter::eq(INSTITUTION_ID, institution_id),
                Filter::document_id(member.id.as_str()),
            ],
            &patch,
        )
        .await?;

    if updated == 0 {
        tracing::error!(
            institution_id,
            member = %member.id,
            "Member document was not updated after a successful lookup"
        );
        return Err(ApiError::UpdateNotApplied);
    }

    tracing::info!(
        institution_id,
        member = %member.id,
        reader = %reader.id,
        location = ?reader.location,
        in_room,
        "Updated member location"
    );

    Ok("User location updated")
}
