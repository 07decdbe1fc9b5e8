use serde::{Deserialize, Serialize};

/// Subscription plans sold through the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCode {
    Basic,
    Pro,
    Ultra,
}

impl PlanCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCode::Basic => "basic",
            PlanCode::Pro => "pro",
            PlanCode::Ultra => "ultra",
        }
    }

    /// Monthly unit price in integer cents. Prices are fixed per plan;
    /// billing-cycle multipliers are applied by the pricing engine.
    pub fn unit_price_cents(&self) -> i64 {
        match self {
            PlanCode::Basic => 990,
            PlanCode::Pro => 1990,
            PlanCode::Ultra => 3990,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanCode::Basic => "Basic",
            PlanCode::Pro => "Pro",
            PlanCode::Ultra => "Ultra",
        }
    }
}

impl std::fmt::Display for PlanCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(PlanCode::Basic),
            "pro" => Ok(PlanCode::Pro),
            "ultra" => Ok(PlanCode::Ultra),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

/// Billing cycle for a plan purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    /// Twelve months paid up front in a single charge.
    Annual,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Annual => "annual",
        }
    }

    pub fn months(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Annual => 12,
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(BillingCycle::Monthly),
            "annual" => Ok(BillingCycle::Annual),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}
