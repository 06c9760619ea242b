//! Variant declarations and the variant-to-record translator.
//!
//! A dimension is a closed set of statically declared variants. Each variant
//! describes its own fields through [`Variant::describe`], which gives the
//! translator a direct table-construction function instead of inspecting
//! types at runtime.
//!
//! ```rust
//! use substate_common::declare_dimension;
//! use substate_common::variant::{translate, Variant};
//!
//! declare_dimension! {
//!     /// Deflector flap positions.
//!     pub enum DeflectorState: "DeflectorState" {
//!         Up = "UP" { "position" => 12.0 },
//!         Down = "DOWN" { "position" => 0.0 },
//!     }
//! }
//!
//! let table = translate::<DeflectorState>();
//! assert_eq!(table.len(), 2);
//! assert_eq!(DeflectorState::Up.name(), "UP");
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::Hash;

use crate::record::{InstanceTable, RecordBuilder};

/// One statically declared member of a dimension.
pub trait Variant: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Dimension name, used in logs and telemetry keys.
    const DIMENSION: &'static str;

    /// All variants in declaration order. The first is the default state.
    fn variants() -> &'static [Self];

    /// Variant name; becomes the record's instance name.
    fn name(&self) -> &'static str;

    /// Add this variant's declared fields to `record`.
    fn describe(&self, record: RecordBuilder) -> RecordBuilder;

    /// Look up a variant by name.
    fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.name() == name)
    }
}

/// Typed token identifying a dimension.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionId {
    type_id: TypeId,
    name: &'static str,
}

impl DimensionId {
    pub fn of<V: Variant>() -> Self {
        Self {
            type_id: TypeId::of::<V>(),
            name: V::DIMENSION,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DimensionId({})", self.name)
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialOrd for DimensionId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DimensionId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.type_id.cmp(&other.type_id))
    }
}

/// Translate a dimension into a table holding one record per variant.
///
/// Pure function of the declaration. Fields whose extraction fails are
/// dropped by [`RecordBuilder::try_with`]; translation itself never fails.
pub fn translate<V: Variant>() -> InstanceTable {
    let mut table = InstanceTable::new();
    for variant in V::variants() {
        let record = variant.describe(RecordBuilder::new(variant.name())).build();
        table.insert(record);
    }
    table
}

/// Declare a dimension enum together with its [`Variant`] impl.
///
/// Each entry names the Rust variant, its instance name, and its fields.
/// Field values may be any expression convertible into
/// [`FieldValue`](crate::value::FieldValue).
#[macro_export]
macro_rules! declare_dimension {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ty:ident : $dim:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $name:literal { $( $field:literal => $value:expr ),* $(,)? }
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $ty {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $crate::variant::Variant for $ty {
            const DIMENSION: &'static str = $dim;

            fn variants() -> &'static [Self] {
                &[ $( Self::$variant, )+ ]
            }

            fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }

            fn describe(
                &self,
                record: $crate::record::RecordBuilder,
            ) -> $crate::record::RecordBuilder {
                match self {
                    $( Self::$variant => record $( .with($field, $value) )*, )+
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    crate::declare_dimension! {
        enum IntakeState: "IntakeState" {
            Idle = "IDLE" { "intakeSpeed" => 0.0, "feederSpeed" => 0.0, "pivot" => "up" },
            Intake = "INTAKE" { "intakeSpeed" => 0.8, "feederSpeed" => 0.4, "pivot" => "down" },
            Outtake = "OUTTAKE" { "intakeSpeed" => -0.8, "feederSpeed" => -0.4, "pivot" => "down" },
        }
    }

    crate::declare_dimension! {
        enum Empty: "Empty" {
            Only = "ONLY" {},
        }
    }

    /// Hand-written impl with one field whose extraction fails.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Flaky {
        A,
    }

    impl Variant for Flaky {
        const DIMENSION: &'static str = "Flaky";

        fn variants() -> &'static [Self] {
            &[Self::A]
        }

        fn name(&self) -> &'static str {
            "A"
        }

        fn describe(&self, record: RecordBuilder) -> RecordBuilder {
            record
                .with("first", 1.0)
                .try_with("broken", "not-a-number".parse::<f64>())
                .with("last", 3.0)
        }
    }

    #[test]
    fn round_trip_declared_values() {
        let table = translate::<IntakeState>();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["IDLE", "INTAKE", "OUTTAKE"]
        );

        let expected: [(&str, [FieldValue; 3]); 3] = [
            ("IDLE", [0.0.into(), 0.0.into(), "up".into()]),
            ("INTAKE", [0.8.into(), 0.4.into(), "down".into()]),
            ("OUTTAKE", [(-0.8).into(), (-0.4).into(), "down".into()]),
        ];
        for (name, values) in expected {
            let rec = table.get(name).unwrap();
            assert_eq!(rec.field_names(), vec!["intakeSpeed", "feederSpeed", "pivot"]);
            assert_eq!(rec.values(), values.to_vec());
        }
    }

    #[test]
    fn failed_field_is_omitted() {
        let table = translate::<Flaky>();
        let rec = table.get("A").unwrap();
        assert_eq!(rec.field_names(), vec!["first", "last"]);
    }

    #[test]
    fn variant_with_no_fields() {
        let table = translate::<Empty>();
        assert!(table.get("ONLY").unwrap().is_empty());
    }

    #[test]
    fn from_name_and_ids() {
        assert_eq!(IntakeState::from_name("OUTTAKE"), Some(IntakeState::Outtake));
        assert_eq!(IntakeState::from_name("outtake"), None);
        assert_eq!(DimensionId::of::<IntakeState>().name(), "IntakeState");
        assert_ne!(DimensionId::of::<IntakeState>(), DimensionId::of::<Empty>());
    }
}
