//! Serde adapters for glam types.
//!
//! Use as `#[serde(with = "crate::serde_utils::vec3")]`; glam is built without its
//! serde feature so scene files stay readable (`{"x": .., "y": .., "z": ..}`).

/// `{x, y, z}` object form of [`glam::Vec3`].
pub mod vec3 {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    pub struct Vec3Repr {
        pub x: f32,
        pub y: f32,
        pub z: f32,
    }

    pub fn serialize<S>(vec: &Vec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Vec3Repr {
            x: vec.x,
            y: vec.y,
            z: vec.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = Vec3Repr::deserialize(deserializer)?;
        Ok(Vec3::new(repr.x, repr.y, repr.z))
    }
}

/// `{x, y, z, w}` object form of [`glam::Quat`]. Deserialized rotations are renormalized.
pub mod quat {
    use glam::Quat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct QuatRepr {
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    }

    pub fn serialize<S>(q: &Quat, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let [x, y, z, w] = q.to_array();
        QuatRepr { x, y, z, w }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Quat, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = QuatRepr::deserialize(deserializer)?;
        let q = Quat::from_xyzw(repr.x, repr.y, repr.z, repr.w);
        if q.length_squared() > 0.0 {
            Ok(q.normalize())
        } else {
            Ok(Quat::IDENTITY)
        }
    }

    pub fn identity() -> Quat {
        Quat::IDENTITY
    }
}
