// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Hand-off to the payment widget.
//!
//! The widget renders its own buttons and does all payment processing. This
//! module only builds what it is given and reads back what it reports.

use serde::{Deserialize, Serialize};

/// Lead retained for the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub name: String,
    pub email: String,
}

/// Parameters passed to the payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: String,
    pub currency: String,
    pub payer_email: String,
    pub payer_name: String,
}

impl PaymentRequest {
    pub fn new(payer: &Payer, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
            payer_email: payer.email.clone(),
            payer_name: payer.name.clone(),
        }
    }
}

/// What the widget reported through its callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentResult {
    Approved { order_id: String },
    Failed { message: String },
}

impl PaymentResult {
    /// Status line shown under the payment buttons.
    pub fn status_message(&self) -> String {
        match self {
            PaymentResult::Approved { order_id } => {
                format!("¡Pago confirmado! Tu número de orden es {order_id}. Revisa tu email para los detalles del taller.")
            }
            PaymentResult::Failed { message } => {
                format!("No pudimos procesar el pago: {message}. Intenta nuevamente.")
            }
        }
    }
}
