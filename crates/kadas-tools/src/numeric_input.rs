//! Numeric entry side channel of the creation tool
//!
//! One text field per item attribute. Pointer moves write formatted values
//! into the fields; edits are parsed back into attribute values.

use glam::IVec2;
use kadas_core::NumericAttribute;

/// Vertical distance between the pointer and the floating fields
pub const INPUT_OFFSET: IVec2 = IVec2::new(0, 20);

#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub label: String,
    pub decimals: usize,
    pub text: String,
}

/// Floating numeric input fields
#[derive(Debug, Clone, PartialEq)]
pub struct NumericInput {
    fields: Vec<InputField>,
    focused: Option<usize>,
    position: IVec2,
    visible: bool,
}

impl NumericInput {
    /// One field per attribute, the first one focused
    pub fn new(attributes: &[NumericAttribute]) -> Self {
        let mut input = Self {
            fields: Vec::new(),
            focused: None,
            position: IVec2::ZERO,
            visible: false,
        };
        input.set_attributes(attributes);
        input
    }

    /// Rebuild the fields for another attribute set
    ///
    /// Position and visibility are kept. An unchanged set keeps its texts
    /// and focus.
    pub fn set_attributes(&mut self, attributes: &[NumericAttribute]) {
        let unchanged = self.fields.len() == attributes.len()
            && self
                .fields
                .iter()
                .zip(attributes)
                .all(|(field, a)| field.label == label(a) && field.decimals == a.decimals);
        if unchanged {
            return;
        }
        self.fields = attributes
            .iter()
            .map(|a| InputField {
                label: label(a),
                decimals: a.decimals,
                text: String::new(),
            })
            .collect();
        self.focused = (!self.fields.is_empty()).then_some(0);
    }

    pub fn fields(&self) -> &[InputField] {
        &self.fields
    }

    /// Write values into the fields, formatted with each field's decimals
    pub fn set_values(&mut self, values: &[f64]) {
        for (field, value) in self.fields.iter_mut().zip(values) {
            field.text = format!("{:.*}", field.decimals, value);
        }
    }

    /// Parse the field texts; unparsable text reads as zero
    pub fn values(&self) -> Vec<f64> {
        self.fields
            .iter()
            .map(|f| f.text.trim().parse().unwrap_or(0.0))
            .collect()
    }

    /// Replace the text of one field, as typed by the user
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.text = text.into();
        }
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn set_focused(&mut self, index: usize) {
        if index < self.fields.len() {
            self.focused = Some(index);
        }
    }

    /// Show the fields just below the pointer
    pub fn show_at(&mut self, screen_pos: IVec2) {
        self.position = screen_pos + INPUT_OFFSET;
        self.visible = true;
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

fn label(attribute: &NumericAttribute) -> String {
    format!("{}:", attribute.name)
}
