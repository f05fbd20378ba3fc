use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

pub const IN_PROGRESS_STATUS: &str = "in progress";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl OrderId {
    /// Accepts integers, floats (truncated), integer text, or a one-element
    /// array holding one of those.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidOrderId(describe(value));

        match value {
            Value::Number(number) => {
                if let Some(id) = number.as_i64() {
                    return Ok(Self(id));
                }
                match number.as_f64() {
                    Some(id) if id.is_finite() && id.abs() < i64::MAX as f64 => {
                        Ok(Self(id.trunc() as i64))
                    }
                    _ => Err(invalid()),
                }
            }
            Value::String(raw) => raw.trim().parse::<i64>().map(Self).map_err(|_| invalid()),
            Value::Array(items) if items.len() == 1 => Self::from_value(&items[0]),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(pub u32);

impl Quantity {
    /// The platform sends quantities as floats (`2.0`); fractions are truncated.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidQuantity(describe(value));

        let number = match value {
            Value::Number(number) => number.as_f64().ok_or_else(invalid)?,
            Value::String(raw) => raw.trim().parse::<f64>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        if !number.is_finite() || number < 0.0 || number > f64::from(u32::MAX) {
            return Err(invalid());
        }

        Ok(Self(number.trunc() as u32))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: String,
    pub quantity: Quantity,
}

/// The in-progress order of one session.
///
/// Item names are unique. Lines keep the position of their first mention, so
/// the rendered order reads back the way the customer built it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    lines: Vec<OrderLine>,
}

impl DraftOrder {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Quantity)>,
        S: Into<String>,
    {
        let mut order = Self::default();
        for (item, quantity) in pairs {
            order.set(item, quantity);
        }
        order
    }

    pub fn set(&mut self, item: impl Into<String>, quantity: Quantity) {
        let item = item.into();
        match self.lines.iter_mut().find(|line| line.item == item) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(OrderLine { item, quantity }),
        }
    }

    /// Last write wins for items present in both orders.
    pub fn merge(&mut self, other: DraftOrder) {
        for line in other.lines {
            self.set(line.item, line.quantity);
        }
    }

    pub fn remove(&mut self, item: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item != item);
        self.lines.len() != before
    }

    pub fn quantity_of(&self, item: &str) -> Option<Quantity> {
        self.lines.iter().find(|line| line.item == item).map(|line| line.quantity)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.quantity_of(item).is_some()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for DraftOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", line.quantity, line.item)?;
        }
        Ok(())
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}
