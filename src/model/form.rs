//! Form state: agronomic field values tagged with their provenance.

use std::collections::BTreeMap;
use std::fmt;

/// An agronomic input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Rainfall,
    Ph,
}

impl Field {
    /// Soil nutrient fields, in display order.
    pub const NUTRIENTS: [Self; 3] = [Self::Nitrogen, Self::Phosphorus, Self::Potassium];

    /// Every field the crop recommendation needs, in display order.
    pub const CROP: [Self; 7] = [
        Self::Nitrogen,
        Self::Phosphorus,
        Self::Potassium,
        Self::Temperature,
        Self::Humidity,
        Self::Rainfall,
        Self::Ph,
    ];

    /// The wire and command name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nitrogen => "nitrogen",
            Self::Phosphorus => "phosphorus",
            Self::Potassium => "potassium",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Rainfall => "rainfall",
            Self::Ph => "ph",
        }
    }

    /// Unit suffix for display.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Nitrogen | Self::Phosphorus | Self::Potassium => "kg/ha",
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Rainfall => "mm",
            Self::Ph => "",
        }
    }

    /// Parse a field name, accepting the short nutrient symbols too.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nitrogen" | "n" => Some(Self::Nitrogen),
            "phosphorus" | "p" => Some(Self::Phosphorus),
            "potassium" | "k" => Some(Self::Potassium),
            "temperature" | "temp" => Some(Self::Temperature),
            "humidity" => Some(Self::Humidity),
            "rainfall" | "rain" => Some(Self::Rainfall),
            "ph" => Some(Self::Ph),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a field's current value came from.
///
/// Transitions only move forward: `Unset → AutoFilled` on a successful
/// autofill, and anything to `UserEdited` on a direct edit. Nothing ever
/// moves a field back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Unset,
    AutoFilled,
    UserEdited,
}

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    provenance: Provenance,
}

/// Per-view form state: field name to numeric string, with provenance.
#[derive(Debug, Clone)]
pub struct FormState {
    slots: BTreeMap<Field, Slot>,
}

impl FormState {
    /// Creates a form with the given fields, all `Unset`.
    pub fn new(fields: &[Field]) -> Self {
        let slots = fields
            .iter()
            .map(|&f| {
                (
                    f,
                    Slot {
                        value: String::new(),
                        provenance: Provenance::Unset,
                    },
                )
            })
            .collect();
        Self { slots }
    }

    /// The fields this form holds, in display order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.slots.keys().copied()
    }

    /// Whether the form holds this field at all.
    pub fn contains(&self, field: Field) -> bool {
        self.slots.contains_key(&field)
    }

    /// The current raw value, or `None` if the field is absent or empty.
    pub fn value(&self, field: Field) -> Option<&str> {
        self.slots
            .get(&field)
            .map(|s| s.value.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// The field's provenance. Absent fields read as `Unset`.
    pub fn provenance(&self, field: Field) -> Provenance {
        self.slots
            .get(&field)
            .map_or(Provenance::Unset, |s| s.provenance)
    }

    /// Records a direct user edit. Returns `false` if the form has no such field.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) -> bool {
        let Some(slot) = self.slots.get_mut(&field) else {
            return false;
        };
        slot.value = value.into();
        slot.provenance = Provenance::UserEdited;
        true
    }

    /// Writes a machine-produced value, only into an `Unset` field.
    ///
    /// Returns whether the value was applied. Provenance is read now,
    /// at resolution time, so an edit made while the fill was in flight wins.
    pub fn autofill(&mut self, field: Field, value: impl Into<String>) -> bool {
        match self.slots.get_mut(&field) {
            Some(slot) if slot.provenance == Provenance::Unset => {
                slot.value = value.into();
                slot.provenance = Provenance::AutoFilled;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_is_unset() {
        let form = FormState::new(&Field::CROP);
        for field in Field::CROP {
            assert_eq!(form.provenance(field), Provenance::Unset);
            assert_eq!(form.value(field), None);
        }
    }

    #[test]
    fn autofill_only_writes_unset() {
        let mut form = FormState::new(&Field::CROP);
        assert!(form.autofill(Field::Temperature, "28.4"));
        assert_eq!(form.provenance(Field::Temperature), Provenance::AutoFilled);

        // A second fill does not replace the first.
        assert!(!form.autofill(Field::Temperature, "30"));
        assert_eq!(form.value(Field::Temperature), Some("28.4"));
    }

    #[test]
    fn user_edit_is_never_overwritten() {
        let mut form = FormState::new(&Field::CROP);
        form.autofill(Field::Humidity, "63");
        assert!(form.edit(Field::Humidity, "70"));
        assert_eq!(form.provenance(Field::Humidity), Provenance::UserEdited);

        assert!(!form.autofill(Field::Humidity, "10"));
        assert_eq!(form.value(Field::Humidity), Some("70"));
    }

    #[test]
    fn clearing_a_field_keeps_user_provenance() {
        let mut form = FormState::new(&Field::CROP);
        form.edit(Field::Ph, "");
        assert_eq!(form.provenance(Field::Ph), Provenance::UserEdited);
        assert_eq!(form.value(Field::Ph), None);
        assert!(!form.autofill(Field::Ph, "6.5"));
    }

    #[test]
    fn edit_unknown_field_is_rejected() {
        let mut form = FormState::new(&Field::NUTRIENTS);
        assert!(!form.edit(Field::Rainfall, "3"));
        assert!(!form.contains(Field::Rainfall));
    }

    #[test]
    fn field_parse_accepts_symbols() {
        assert_eq!(Field::parse("N"), Some(Field::Nitrogen));
        assert_eq!(Field::parse("ph"), Some(Field::Ph));
        assert_eq!(Field::parse("rain"), Some(Field::Rainfall));
        assert_eq!(Field::parse("soil"), None);
    }
}
