//! Static field declarations for the operator catalog.

/// Storage type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Surrogate row identity. Never filtered or sorted on.
    Identity,
    Text,
    Integer,
    Date,
}

impl FieldKind {
    /// Whether callers may order results by a field of this kind.
    pub fn is_sortable(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Date)
    }

    /// Whether free-text search looks at a field of this kind.
    pub fn is_searchable(self) -> bool {
        matches!(self, FieldKind::Text)
    }
}

/// A single column of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}

/// Column table for [`Operator`](super::Operator), in declaration order.
pub const OPERATOR_SCHEMA: &[FieldDef] = &[
    field("id", FieldKind::Identity),
    field("operator_registry", FieldKind::Text),
    field("cnpj", FieldKind::Text),
    field("corporate_name", FieldKind::Text),
    field("trade_name", FieldKind::Text),
    field("modality", FieldKind::Text),
    field("street", FieldKind::Text),
    field("number", FieldKind::Text),
    field("complement", FieldKind::Text),
    field("neighborhood", FieldKind::Text),
    field("city", FieldKind::Text),
    field("state", FieldKind::Text),
    field("zip", FieldKind::Text),
    field("area_code", FieldKind::Text),
    field("phone", FieldKind::Text),
    field("fax", FieldKind::Text),
    field("email", FieldKind::Text),
    field("representative", FieldKind::Text),
    field("representative_position", FieldKind::Text),
    field("sales_region", FieldKind::Integer),
    field("registration_date", FieldKind::Date),
];

/// Iterate over the searchable (textual) fields of a schema.
pub fn searchable_fields(schema: &[FieldDef]) -> impl Iterator<Item = &FieldDef> {
    schema.iter().filter(|f| f.kind.is_searchable())
}
