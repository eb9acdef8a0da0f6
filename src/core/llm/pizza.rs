//! Pizza ordering tool

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::tools::{ToolError, ToolHandler};

pub const PIZZA_SIZES: &[&str] = &["small", "medium", "large"];

pub const PIZZA_TOPPINGS: &[&str] = &[
    "cheese",
    "pepperoni",
    "mushrooms",
    "onions",
    "sausage",
    "olives",
    "bell peppers",
];

pub const CRUST_TYPES: &[&str] = &["thin", "regular", "thick", "stuffed"];

/// Spoken when the order fails validation
pub const ORDER_ISSUE: &str =
    "I'm sorry, but there seems to be an issue with your order. Can you please confirm the details?";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PizzaOrder {
    pub size: String,
    pub toppings: Vec<String>,
    pub crust: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderValidation {
    pub size_valid: bool,
    pub toppings_valid: bool,
    pub crust_valid: bool,
}

impl OrderValidation {
    pub fn order_complete(&self) -> bool {
        self.size_valid && self.toppings_valid && self.crust_valid
    }
}

fn is_one_of(value: &str, allowed: &[&str]) -> bool {
    let value = value.trim().to_lowercase();
    allowed.iter().any(|candidate| *candidate == value)
}

impl PizzaOrder {
    pub fn validate(&self) -> OrderValidation {
        OrderValidation {
            size_valid: is_one_of(&self.size, PIZZA_SIZES),
            toppings_valid: self
                .toppings
                .iter()
                .all(|topping| is_one_of(topping, PIZZA_TOPPINGS)),
            crust_valid: is_one_of(&self.crust, CRUST_TYPES),
        }
    }

    pub fn confirmation(&self) -> String {
        format!(
            "Great! I've processed your order for a {} pizza with {} and {} crust. Have a great day!",
            self.size,
            self.toppings.join(", "),
            self.crust
        )
    }
}

/// `process_pizza_order` tool
#[derive(Debug, Default)]
pub struct PizzaOrderTool;

impl ToolHandler for PizzaOrderTool {
    fn name(&self) -> &'static str {
        "process_pizza_order"
    }

    fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": "Process a pizza order with the given details",
            "parameters": {
                "type": "object",
                "properties": {
                    "size": {
                        "type": "string",
                        "description": "The size of the pizza",
                        "enum": PIZZA_SIZES
                    },
                    "toppings": {
                        "type": "array",
                        "items": {"type": "string", "enum": PIZZA_TOPPINGS},
                        "description": "List of toppings for the pizza"
                    },
                    "crust": {
                        "type": "string",
                        "description": "The type of crust for the pizza",
                        "enum": CRUST_TYPES
                    }
                },
                "required": ["size", "toppings", "crust"]
            }
        })
    }

    fn invoke(&self, args: Value) -> Result<String, ToolError> {
        let order: PizzaOrder =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let validation = order.validate();

        if !validation.order_complete() {
            info!(?order, ?validation, "Pizza order rejected");
            return Ok(ORDER_ISSUE.to_string());
        }

        info!(
            size = %order.size,
            toppings = ?order.toppings,
            crust = %order.crust,
            "Pizza order placed"
        );
        Ok(order.confirmation())
    }
}
