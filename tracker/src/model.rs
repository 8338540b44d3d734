//! Document field names and typed views over the stored entities.
use docstore::Document;

pub const INSTITUTION_ID: &str = "institution_id";

pub mod member {
    pub const RFID_UID: &str = "rfid_uid";
    pub const RFID_LOCATION: &str = "rfid_location";
    pub const IN_ROOM: &str = "in_room";
    pub const LAST_LOCATION_ENTRY: &str = "last_location_entry";
}

pub mod reader {
    pub const MAC_ADDRESS: &str = "reader_mac_address";
    pub const LOCATION: &str = "location";
    pub const LAST_ONLINE: &str = "last_online";
}

pub mod institution_key {
    pub const API_KEY: &str = "api_key";
}

/// A tracked person as read by the location update. A missing room means none is known yet,
/// a missing flag means not in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: String,
    pub rfid_location: Option<String>,
    pub in_room: bool,
}

impl From<Document> for Member {
    fn from(doc: Document) -> Self {
        Member {
            rfid_location: doc.get_str(member::RFID_LOCATION).map(String::from),
            in_room: doc.get_bool(member::IN_ROOM).unwrap_or(false),
            id: doc.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reader {
    pub id: String,
    pub location: Option<String>,
}

impl From<Document> for Reader {
    fn from(doc: Document) -> Self {
        Reader {
            location: doc.get_str(reader::LOCATION).map(String::from),
            id: doc.id,
        }
    }
}
