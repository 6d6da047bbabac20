//! Payment gateway client trait and simulated implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{OrderDetails, PaymentStatus};
use thiserror::Error;

/// A payment submission for one order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: String,
    pub sku: String,
    pub units: u32,
    pub price: f64,
    pub user_id: String,
    /// Status of the previous attempt, if any; lets the gateway distinguish
    /// first submissions from retries.
    pub existing_status: Option<PaymentStatus>,
}

impl PaymentRequest {
    /// Builds a request from validated order details.
    pub fn from_details(details: &OrderDetails, existing_status: Option<PaymentStatus>) -> Self {
        Self {
            order_id: details.order_id.as_str().to_string(),
            sku: details.sku.clone(),
            units: details.units,
            price: details.price,
            user_id: details.user_id.clone(),
            existing_status,
        }
    }
}

/// The gateway's decision on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Accepted,
    Rejected,
}

/// Result of a gateway submission that produced a decision.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// The payment ID assigned by the gateway.
    pub payment_id: String,
    pub status: GatewayStatus,
}

/// Errors the gateway client can report.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The attempt failed without a decision (simulated business failure).
    /// Transient: the message is redelivered and the attempt retried.
    #[error("payment failed at gateway for order {order_id}")]
    PaymentFailed { order_id: String },

    /// The gateway could not be reached at all.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Trait for payment gateway clients.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits a payment attempt for an order.
    async fn submit(&self, request: PaymentRequest) -> Result<GatewayResponse, GatewayError>;
}

/// How the simulated gateway responds to submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayBehavior {
    /// Every submission is accepted.
    #[default]
    Accept,
    /// Every submission is rejected with a payment id.
    Reject,
    /// Every submission fails without a decision.
    Fail,
}

impl std::str::FromStr for GatewayBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accept" => Ok(GatewayBehavior::Accept),
            "reject" => Ok(GatewayBehavior::Reject),
            "fail" => Ok(GatewayBehavior::Fail),
            other => Err(format!("unknown gateway behavior: {other}")),
        }
    }
}

#[derive(Debug, Default)]
struct SimulatedGatewayState {
    behavior: GatewayBehavior,
    next_id: u32,
    submissions: Vec<PaymentRequest>,
}

/// Simulated payment gateway.
///
/// Issues sequential `PAY-NNNN` payment ids and records every submission so
/// tests can assert on gateway traffic.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    state: Arc<RwLock<SimulatedGatewayState>>,
}

impl SimulatedGateway {
    /// Creates a gateway that accepts every submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway with the given behavior.
    pub fn with_behavior(behavior: GatewayBehavior) -> Self {
        let gateway = Self::default();
        gateway.set_behavior(behavior);
        gateway
    }

    /// Changes how subsequent submissions are answered.
    pub fn set_behavior(&self, behavior: GatewayBehavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Returns the number of submissions received.
    pub fn submission_count(&self) -> usize {
        self.state.read().unwrap().submissions.len()
    }

    /// Returns the most recent submission, if any.
    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.state.read().unwrap().submissions.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn submit(&self, request: PaymentRequest) -> Result<GatewayResponse, GatewayError> {
        let mut state = self.state.write().unwrap();
        let order_id = request.order_id.clone();
        state.submissions.push(request);

        match state.behavior {
            GatewayBehavior::Fail => Err(GatewayError::PaymentFailed { order_id }),
            decided => {
                state.next_id += 1;
                let payment_id = format!("PAY-{:04}", state.next_id);
                let status = if decided == GatewayBehavior::Accept {
                    GatewayStatus::Accepted
                } else {
                    GatewayStatus::Rejected
                };
                Ok(GatewayResponse { payment_id, status })
            }
        }
    }
}
