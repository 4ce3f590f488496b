/* 📖 # Why have a dedicated item model?

An Item is the single record type the service manages: a store-assigned id, a
required name and an optional description. Request bodies never reach the store
directly. They are parsed into NewItem or ItemPatch and validated into ValidItem or
ValidPatch, and only those validated types are accepted by ItemStore. A record with
an empty name cannot be constructed outside this module.
*/

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use shelf_base::{ShelfError, ShelfResult};

/// Message reported when a create or update carries no usable name.
pub const NAME_REQUIRED: &str = "Name is required";

/// A persisted item record.
///
/// Serialized with the id under `_id`; `description` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    id: ItemId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Item {
    /// Build a record from validated fields under a freshly assigned id.
    pub fn new(id: ItemId, fields: ValidItem) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Apply the fields present in `patch`. The id never changes.
    pub fn apply(&mut self, patch: ValidPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }

    /// Check the invariants of a record loaded from storage.
    pub fn check(&self) -> ShelfResult<()> {
        if is_blank(&self.name) {
            return Err(Box::new(
                ShelfError::validation(NAME_REQUIRED).context(format!("item {}", self.id)),
            ));
        }
        Ok(())
    }
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/* 📖 # Why 12-byte object ids?

Ids are document-database object ids: 12 bytes rendered as 24 lowercase hex
characters, starting with the big-endian Unix seconds of creation. Clients that
already handle such ids keep working, and a path segment can be rejected as
malformed before any store lookup. Generation and parsing come from `bson`.
*/

/// Unique identifier of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(ObjectId);

impl ItemId {
    /// Generate a new id, unique within this process.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    /// Parse a 24-character hex id. Returns None for anything else.
    ///
    /// ```
    /// use shelf_engine::ItemId;
    ///
    /// assert!(ItemId::parse("65a1f0c2e4b0a1b2c3d4e5f6").is_some());
    /// assert!(ItemId::parse("not-an-id").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        ObjectId::parse_str(s).ok().map(Self)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ItemId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed item id '{}'", s)))
    }
}

/// Body of a create request.
///
/// Every field is optional at the parsing stage so that a missing name surfaces as a
/// validation error rather than a parse error. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fields of an item that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidItem {
    name: String,
    description: Option<String>,
}

impl NewItem {
    /// Require a non-blank name. The name is stored as sent.
    pub fn validate(self) -> ShelfResult<ValidItem> {
        match self.name {
            Some(name) if !is_blank(&name) => Ok(ValidItem {
                name,
                description: self.description,
            }),
            _ => Err(Box::new(ShelfError::validation(NAME_REQUIRED))),
        }
    }
}

/// Body of an update request. Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An update that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidPatch {
    name: Option<String>,
    description: Option<String>,
}

impl ItemPatch {
    /// A name, when present, must not be blank.
    pub fn validate(self) -> ShelfResult<ValidPatch> {
        if let Some(name) = &self.name {
            if is_blank(name) {
                return Err(Box::new(ShelfError::validation(NAME_REQUIRED)));
            }
        }
        Ok(ValidPatch {
            name: self.name,
            description: self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    fn valid(name: &str, description: Option<&str>) -> ValidItem {
        NewItem {
            name: Some(name.to_string()),
            description: description.map(str::to_string),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique_and_hex() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);

        let text = a.to_string();
        assert_eq!(text.len(), 24);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(ItemId::parse(&text), Some(a));
    }

    #[test]
    fn test_generated_id_starts_with_creation_time() {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let id = ItemId::generate();
        let seconds = u32::from_str_radix(&id.to_string()[..8], 16).unwrap() as u64;
        assert!(seconds + 1 >= now && seconds <= now + 1);
    }

    #[test]
    fn test_id_matches_object_id_text() {
        let text = "65a1f0c2e4b0a1b2c3d4e5f6";
        let id = ItemId::parse(text).unwrap();
        assert_eq!(id.0, ObjectId::parse_str(text).unwrap());
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", text));
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let id = ItemId::parse("65A1F0C2E4B0A1B2C3D4E5F6").unwrap();
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ItemId::parse("").is_none());
        assert!(ItemId::parse("123").is_none());
        assert!(ItemId::parse("65a1f0c2e4b0a1b2c3d4e5f").is_none());
        assert!(ItemId::parse("65a1f0c2e4b0a1b2c3d4e5f67").is_none());
        assert!(ItemId::parse("zza1f0c2e4b0a1b2c3d4e5f6").is_none());
        assert!(ItemId::parse("65a1f0c2e4b0a1b2c3d4e5é").is_none());
    }

    #[test]
    fn test_item_serialization() {
        let id = ItemId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let item = Item::new(id, valid("Lamp", Some("Desk lamp")));
        expect![[r#"{"_id":"65a1f0c2e4b0a1b2c3d4e5f6","name":"Lamp","description":"Desk lamp"}"#]]
            .assert_eq(&serde_json::to_string(&item).unwrap());

        let bare = Item::new(id, valid("Lamp", None));
        expect![[r#"{"_id":"65a1f0c2e4b0a1b2c3d4e5f6","name":"Lamp"}"#]]
            .assert_eq(&serde_json::to_string(&bare).unwrap());
    }

    #[test]
    fn test_item_deserialization_rejects_bad_id() {
        let result = serde_json::from_str::<Item>(r#"{"_id":"nope","name":"Lamp"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_item_requires_name() {
        let missing = NewItem::default().validate().unwrap_err();
        assert!(missing.is_validation());
        assert_eq!(missing.to_string(), NAME_REQUIRED);

        let blank = NewItem {
            name: Some("   ".to_string()),
            description: Some("x".to_string()),
        };
        assert!(blank.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_new_item_ignores_unknown_fields() {
        let parsed: NewItem =
            serde_json::from_str(r#"{"name":"Lamp","colour":"red","price":3}"#).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Lamp"));
        assert!(parsed.description.is_none());
    }

    #[test]
    fn test_new_item_rejects_non_string_name() {
        assert!(serde_json::from_str::<NewItem>(r#"{"name":42}"#).is_err());
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let id = ItemId::generate();
        let mut item = Item::new(id, valid("Lamp", Some("Desk lamp")));

        let patch = ItemPatch {
            name: None,
            description: Some("Floor lamp".to_string()),
        };
        item.apply(patch.validate().unwrap());

        assert_eq!(item.id(), &id);
        assert_eq!(item.name(), "Lamp");
        assert_eq!(item.description(), Some("Floor lamp"));
    }

    #[test]
    fn test_patch_rejects_empty_name() {
        let patch = ItemPatch {
            name: Some(String::new()),
            description: None,
        };
        assert!(patch.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_check_rejects_blank_stored_name() {
        let item: Item =
            serde_json::from_str(r#"{"_id":"65a1f0c2e4b0a1b2c3d4e5f6","name":""}"#).unwrap();
        let err = item.check().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "item 65a1f0c2e4b0a1b2c3d4e5f6: Name is required"
        );
    }
}
