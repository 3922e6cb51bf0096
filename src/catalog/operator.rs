//! Operator record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered health-plan operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: u64,
    pub operator_registry: String,
    pub cnpj: String,
    pub corporate_name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    pub modality: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub area_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    pub email: String,
    pub representative: String,
    pub representative_position: String,
    #[serde(default)]
    pub sales_region: Option<i64>,
    pub registration_date: NaiveDate,
}

/// Borrowed view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Date(NaiveDate),
}

impl Operator {
    /// Look up a field by its schema name.
    ///
    /// Returns `None` both for unknown names and for absent optional values.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        fn text(s: &str) -> Option<FieldValue<'_>> {
            Some(FieldValue::Text(s))
        }
        fn opt_text(s: &Option<String>) -> Option<FieldValue<'_>> {
            s.as_deref().map(FieldValue::Text)
        }

        match name {
            "id" => i64::try_from(self.id).ok().map(FieldValue::Integer),
            "operator_registry" => text(&self.operator_registry),
            "cnpj" => text(&self.cnpj),
            "corporate_name" => text(&self.corporate_name),
            "trade_name" => opt_text(&self.trade_name),
            "modality" => text(&self.modality),
            "street" => text(&self.street),
            "number" => text(&self.number),
            "complement" => opt_text(&self.complement),
            "neighborhood" => text(&self.neighborhood),
            "city" => text(&self.city),
            "state" => text(&self.state),
            "zip" => text(&self.zip),
            "area_code" => opt_text(&self.area_code),
            "phone" => opt_text(&self.phone),
            "fax" => opt_text(&self.fax),
            "email" => text(&self.email),
            "representative" => text(&self.representative),
            "representative_position" => text(&self.representative_position),
            "sales_region" => self.sales_region.map(FieldValue::Integer),
            "registration_date" => Some(FieldValue::Date(self.registration_date)),
            _ => None,
        }
    }

    /// Textual value of a field, if it is a present text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}
