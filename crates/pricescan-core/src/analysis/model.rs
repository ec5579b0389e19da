//! Analysis result domain model.
//!
//! The wire shape of a price estimate. Field names are camelCase on the wire
//! and every field is always present: anything the model leaves out is taken
//! from [`AnalysisResult::placeholder`].

use serde::{Deserialize, Deserializer, Serialize};

/// Online marketplaces listed by default, in display order.
pub const DEFAULT_PLATFORMS: [&str; 5] = [
    "蝦皮購物",
    "PChome 24h",
    "momo購物網",
    "露天拍賣",
    "Yahoo拍賣",
];

const SCORE_MIN: u8 = 1;
const SCORE_MAX: u8 = 100;
const DEFAULT_SCORE: u8 = 50;

/// Complete price estimate for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub name: String,
    pub price: String,
    pub price_note: String,
    pub description: String,
    pub origin: String,
    pub material: String,
    pub usage: String,
    pub category: String,
    pub brand: String,
    pub size: String,
    pub weight: String,
    pub warranty: String,
    pub availability: String,
    /// 1..=100
    #[serde(deserialize_with = "de_score")]
    pub popularity_score: u8,
    /// 1..=100
    #[serde(deserialize_with = "de_score")]
    pub eco_score: u8,
    pub durability: String,
    pub maintenance: String,
    pub tips: Vec<String>,
    pub related_items: Vec<RelatedItem>,
    pub purchase_links: PurchaseLinks,
}

/// An item shown next to the result, e.g. accessories or alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelatedItem {
    pub icon: String,
    pub name: String,
}

/// Where the item can be bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseLinks {
    pub online: Vec<OnlineListing>,
    /// Physical stores or locations.
    pub offline: Vec<String>,
}

/// A marketplace paired with the term to search for there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OnlineListing {
    pub platform: String,
    pub search_term: String,
}

impl AnalysisResult {
    /// The documented default object used for anything the model did not supply.
    pub fn placeholder() -> Self {
        Self {
            name: "無法辨識的物品".to_string(),
            price: "NT$ 無法估算".to_string(),
            price_note: "暫無價格說明".to_string(),
            description: "暫無描述".to_string(),
            origin: "暫無背景資訊".to_string(),
            material: "未知".to_string(),
            usage: "未知".to_string(),
            category: "其他".to_string(),
            brand: "未知".to_string(),
            size: "未知".to_string(),
            weight: "未知".to_string(),
            warranty: "未知".to_string(),
            availability: "請洽詢相關店家".to_string(),
            popularity_score: DEFAULT_SCORE,
            eco_score: DEFAULT_SCORE,
            durability: "未知".to_string(),
            maintenance: "請依一般方式保養".to_string(),
            tips: vec![
                "多方比價後再購買".to_string(),
                "確認商品來源與保固".to_string(),
                "留意促銷活動".to_string(),
            ],
            related_items: vec![
                RelatedItem::new("🔗", "相關物品"),
                RelatedItem::new("🔍", "類似商品"),
                RelatedItem::new("💡", "替代選擇"),
            ],
            purchase_links: PurchaseLinks::default(),
        }
    }

    /// Build a result from the JSON object returned by the model.
    ///
    /// `null` members are treated as absent so they fall back to the
    /// placeholder instead of failing deserialization; `null` list entries
    /// are dropped.
    pub fn from_model_json(mut value: serde_json::Value) -> serde_json::Result<Self> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        prune_nulls(&mut value);
        let mut result: Self = serde_json::from_value(value)?;
        result.clamp_scores();
        Ok(result)
    }

    /// Copy a search term into every online listing.
    pub fn set_search_terms(&mut self, term: &str) {
        for listing in &mut self.purchase_links.online {
            listing.search_term = term.to_string();
        }
    }

    fn clamp_scores(&mut self) {
        self.popularity_score = self.popularity_score.clamp(SCORE_MIN, SCORE_MAX);
        self.eco_score = self.eco_score.clamp(SCORE_MIN, SCORE_MAX);
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl RelatedItem {
    pub fn new(icon: &str, name: &str) -> Self {
        Self {
            icon: icon.to_string(),
            name: name.to_string(),
        }
    }
}

impl Default for PurchaseLinks {
    fn default() -> Self {
        Self {
            online: DEFAULT_PLATFORMS
                .iter()
                .map(|platform| OnlineListing {
                    platform: platform.to_string(),
                    search_term: String::new(),
                })
                .collect(),
            offline: vec!["百貨公司".to_string(), "相關專賣店".to_string()],
        }
    }
}

/// Accept integers, floats and numeric strings; anything else keeps the default.
fn de_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(SCORE_MIN as f64, SCORE_MAX as f64) as u8)
        .unwrap_or(DEFAULT_SCORE))
}

fn prune_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(prune_nulls);
        }
        serde_json::Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(prune_nulls);
        }
        _ => {}
    }
}
