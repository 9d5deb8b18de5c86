//! Discovery document input.
//!
//! A discovery document arrives either as free text or as a structured record.
//! Structured records are rendered to pretty-printed JSON, in the key order of
//! the source document, before they enter the pipeline, so the controller only
//! ever sees text.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use crate::error::{Result, SdrError};

/// Client-supplied business requirements discovery input.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryInput {
    Text(String),
    Structured(Value),
}

impl DiscoveryInput {
    /// Load from a file: `.json` files are parsed as structured records, anything
    /// else is taken verbatim as text.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SdrError::Discovery(format!("Failed to read {}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            let value: Value = serde_json::from_str(&content)
                .map_err(|e| SdrError::Discovery(format!("Invalid JSON in {}: {}", path.display(), e)))?;
            Ok(DiscoveryInput::Structured(value))
        } else if content.trim().is_empty() {
            Err(SdrError::Discovery(format!("{} is empty", path.display())))
        } else {
            Ok(DiscoveryInput::Text(content))
        }
    }

    /// Text handed to the pipeline
    pub fn to_document(&self) -> Result<String> {
        match self {
            DiscoveryInput::Text(text) => Ok(text.clone()),
            DiscoveryInput::Structured(value) => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, DiscoveryInput::Structured(_))
    }

    /// Company, industry and platforms, when the record carries a `client_info` block
    pub fn summary(&self) -> Option<ClientSummary> {
        let DiscoveryInput::Structured(value) = self else {
            return None;
        };
        let info = value.get("client_info")?;
        Some(ClientSummary {
            company_name: info.get("company_name")?.as_str()?.to_string(),
            industry: info
                .get("industry")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            platforms: info
                .get("platforms")
                .and_then(Value::as_array)
                .map(|p| p.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }
}

impl From<String> for DiscoveryInput {
    fn from(text: String) -> Self {
        DiscoveryInput::Text(text)
    }
}

impl From<Value> for DiscoveryInput {
    fn from(value: Value) -> Self {
        DiscoveryInput::Structured(value)
    }
}

/// Headline facts about the client, shown before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSummary {
    pub company_name: String,
    pub industry: String,
    pub platforms: Vec<String>,
}

/// Built-in e-commerce discovery record used for demos.
pub fn sample_ecommerce() -> DiscoveryInput {
    DiscoveryInput::Structured(json!({
        "client_info": {
            "company_name": "ShopKorea",
            "industry": "E-commerce",
            "vertical": "Fashion & Lifestyle",
            "website": "www.shopkorea.com",
            "platforms": ["Web", "Mobile App (iOS/Android)"]
        },
        "business_objectives": [
            "Understand customer purchase behavior and conversion funnel",
            "Optimize product recommendation effectiveness",
            "Measure marketing campaign ROI across channels",
            "Improve user experience based on navigation patterns",
            "Track cart abandonment and recovery strategies"
        ],
        "key_kpis": [
            {
                "kpi": "Conversion Rate",
                "definition": "Percentage of visitors who complete a purchase",
                "target": "3.5%"
            },
            {
                "kpi": "Average Order Value (AOV)",
                "definition": "Average transaction amount per order",
                "target": "$85"
            },
            {
                "kpi": "Cart Abandonment Rate",
                "definition": "Percentage of users who add items but don't complete purchase",
                "target": "<65%"
            },
            {
                "kpi": "Product View to Add-to-Cart Rate",
                "definition": "Percentage of product views that result in add-to-cart",
                "target": "15%"
            }
        ],
        "user_journeys": [
            {
                "journey": "Product Discovery & Purchase",
                "steps": [
                    "Homepage visit",
                    "Category browse / Search",
                    "Product detail page view",
                    "Add to cart",
                    "View cart",
                    "Checkout initiation",
                    "Payment information",
                    "Order confirmation"
                ]
            },
            {
                "journey": "Account Management",
                "steps": [
                    "User registration",
                    "Login",
                    "Profile update",
                    "Order history view",
                    "Wishlist management"
                ]
            }
        ],
        "critical_events": [
            "Product view",
            "Add to cart",
            "Remove from cart",
            "Checkout initiation",
            "Purchase completion",
            "Search performed",
            "Filter applied",
            "Product recommendation click",
            "User registration",
            "User login"
        ],
        "data_requirements": {
            "product_data": [
                "Product ID",
                "Product name",
                "Product category (L1, L2, L3)",
                "Product price",
                "Product brand",
                "Stock status",
                "Discount/promotion applied"
            ],
            "user_data": [
                "User ID (hashed)",
                "User type (guest/registered/premium)",
                "User segment",
                "Login status"
            ],
            "transaction_data": [
                "Order ID",
                "Revenue",
                "Tax",
                "Shipping cost",
                "Payment method",
                "Coupon code used"
            ]
        },
        "technical_context": {
            "website_type": "Single Page Application (React)",
            "mobile_app": "Native (iOS Swift, Android Kotlin)",
            "tag_management": "Adobe Launch",
            "existing_analytics": "Google Analytics (to be replaced)",
            "data_layer": "Currently none - needs to be implemented"
        },
        "marketing_channels": [
            "Paid Search (Google Ads, Naver)",
            "Display Advertising",
            "Social Media (Instagram, Facebook, KakaoTalk)",
            "Email Marketing",
            "Affiliate Marketing",
            "Organic Search"
        ],
        "success_criteria": [
            "All critical user journeys tracked accurately",
            "Real-time dashboard showing key KPIs",
            "Marketing attribution report available",
            "Data quality >95% (validated tags firing correctly)"
        ]
    }))
}
