use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// UUID identifier tagged with the entity it belongs to, so a `ClientId` cannot be passed
/// where a `ProductId` is expected.
pub struct TypedId<T> {
    value: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedId<T> {
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    pub const fn from_uuid(value: Uuid) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> Uuid {
        self.value
    }
}

impl<T> Default for TypedId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for TypedId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedId({})", self.value)
    }
}

impl<T> fmt::Display for TypedId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> FromStr for TypedId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod typed_id_tests {
    use super::*;
    use rstest::rstest;

    struct Marker;
    type MarkerId = TypedId<Marker>;

    #[rstest]
    fn it_should_compare_by_value() {
        let uuid = Uuid::now_v7();
        assert_eq!(MarkerId::from_uuid(uuid), MarkerId::from_uuid(uuid));
        assert_ne!(MarkerId::new(), MarkerId::new());
    }

    #[rstest]
    fn it_should_parse_its_display_form() {
        let id = MarkerId::new();
        let parsed: MarkerId = id.to_string().parse().expect("parse failed");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<MarkerId>().is_err());
    }

    #[rstest]
    fn it_should_serialize_as_a_bare_uuid() {
        let id = MarkerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.value()));
        let back: MarkerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
