//! Request payload and estimate schema types for the agent API.
//!
//! The agent accepts a free-text project description plus an optional
//! "response structure": a JSON-schema style template describing the estimate
//! the caller wants back (line items, sub-items, unit and cost types). The
//! wire format is camelCase.

use serde::{Deserialize, Serialize};

use crate::stream::ActionDirective;

/// Measurement units the agent may assign to a line item.
pub const DEFAULT_UNIT_TYPES: &[&str] = &[
    "unit",
    "sq-ft",
    "board-ft",
    "hour",
    "day",
    "package",
    "linear-ft",
];

/// Cost categories the agent may assign to a line item.
pub const DEFAULT_COST_TYPES: &[&str] =
    &["material", "labor", "equipment", "subcontractor", "other"];

/// A single typed field in the response structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: String,
}

impl FieldDefinition {
    pub fn new(field_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            description: description.into(),
        }
    }
}

/// A string field constrained to an enumeration of allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumFieldDefinition {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "enum")]
    pub allowed: Vec<String>,
    pub description: String,
}

impl EnumFieldDefinition {
    fn new(allowed: &[&str], description: &str) -> Self {
        Self {
            field_type: "string".to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            description: description.to_string(),
        }
    }

    /// The unit-type field with the standard measurement units.
    pub fn unit_type() -> Self {
        Self::new(DEFAULT_UNIT_TYPES, "Type of unit being measured")
    }

    /// The cost-type field with the standard cost categories.
    pub fn cost_type() -> Self {
        Self::new(DEFAULT_COST_TYPES, "Type of cost (material, labor, etc.)")
    }
}

/// Template for a sub-item nested under a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItemDefinition {
    pub description: FieldDefinition,
    pub quantity: FieldDefinition,
    pub unit_price: FieldDefinition,
    pub unit_type: EnumFieldDefinition,
    pub amount: FieldDefinition,
}

impl Default for SubItemDefinition {
    fn default() -> Self {
        Self {
            description: FieldDefinition::new("string", "Description of the sub-item"),
            quantity: FieldDefinition::new("number", "Quantity of units"),
            unit_price: FieldDefinition::new("number", "Price per unit"),
            unit_type: EnumFieldDefinition::unit_type(),
            amount: FieldDefinition::new(
                "number",
                "Total amount for this sub-item (quantity × unitPrice)",
            ),
        }
    }
}

/// Template for one estimate line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDefinition {
    pub description: FieldDefinition,
    pub quantity: FieldDefinition,
    pub unit_price: FieldDefinition,
    pub unit_type: EnumFieldDefinition,
    pub cost_type: EnumFieldDefinition,
    pub amount: FieldDefinition,
    pub sub_items: Vec<SubItemDefinition>,
}

impl Default for LineItemDefinition {
    fn default() -> Self {
        Self {
            description: FieldDefinition::new("string", "Description of the line item"),
            quantity: FieldDefinition::new("number", "Quantity of units"),
            unit_price: FieldDefinition::new("number", "Price per unit"),
            unit_type: EnumFieldDefinition::unit_type(),
            cost_type: EnumFieldDefinition::cost_type(),
            amount: FieldDefinition::new(
                "number",
                "Total amount for this line item (quantity × unitPrice)",
            ),
            sub_items: vec![SubItemDefinition::default()],
        }
    }
}

/// Template for the whole estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDefinition {
    pub title: FieldDefinition,
    pub total_amount: FieldDefinition,
    pub currency: FieldDefinition,
    pub line_items: Vec<LineItemDefinition>,
}

impl Default for EstimateDefinition {
    fn default() -> Self {
        Self {
            title: FieldDefinition::new("string", "Title of the estimate"),
            total_amount: FieldDefinition::new("number", "Total amount of the estimate"),
            currency: FieldDefinition::new("string", "Currency code (e.g., USD, EUR, GBP)"),
            line_items: vec![LineItemDefinition::default()],
        }
    }
}

/// Top-level response structure sent with the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseStructure {
    pub estimate: EstimateDefinition,
}

/// Request payload for the streaming estimate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Natural-language description of the construction project.
    pub description: String,
    /// Optional template describing the estimate shape the caller expects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_structure: Option<ResponseStructure>,
}

impl EstimateRequest {
    /// Create a request with just a project description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            response_structure: None,
        }
    }

    /// Attach the default estimate template.
    pub fn with_default_structure(mut self) -> Self {
        self.response_structure = Some(ResponseStructure::default());
        self
    }
}

/// One line item accumulated from streamed action directives.
///
/// Values stay as text; numeric interpretation (quantity, prices) belongs to
/// the grid layer that consumes the draft.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineItemDraft {
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub unit_type: Option<String>,
    pub cost_type: Option<String>,
    pub amount: Option<String>,
}

impl LineItemDraft {
    /// Apply one directive. Both snake_case and camelCase field names are
    /// accepted; unrecognized fields are ignored.
    pub fn apply(&mut self, directive: &ActionDirective) {
        let value = Some(directive.value.clone());
        match directive.field.as_str() {
            "description" => self.description = value,
            "quantity" => self.quantity = value,
            "unit_price" | "unitPrice" => self.unit_price = value,
            "unit_type" | "unitType" => self.unit_type = value,
            "cost_type" | "costType" => self.cost_type = value,
            "amount" => self.amount = value,
            _ => {}
        }
    }

    /// Build a draft from a directive sequence (later directives win).
    pub fn from_directives<'a>(directives: impl IntoIterator<Item = &'a ActionDirective>) -> Self {
        let mut draft = Self::default();
        for directive in directives {
            draft.apply(directive);
        }
        draft
    }

    /// Whether no directive has populated the draft yet.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
