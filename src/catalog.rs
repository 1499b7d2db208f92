// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Waste category catalog shown by front-ends

use serde::{Deserialize, Serialize};

/// A display category with its front-end decoration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub gradient: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

fn category(
    id: &str,
    name: &str,
    icon: &str,
    color: &str,
    gradient: &str,
    description: &str,
    examples: &[&str],
) -> WasteCategory {
    WasteCategory {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        gradient: gradient.to_string(),
        description: description.to_string(),
        examples: examples.iter().map(|s| s.to_string()).collect(),
    }
}

/// The four bins the front-ends know about
pub fn waste_categories() -> Vec<WasteCategory> {
    vec![
        category(
            "recyclable",
            "Recyclable Waste",
            "♻️",
            "bg-primary-500",
            "from-primary-400 to-primary-600",
            "Paper, Glass, Metal, Plastic",
            &[
                "Paper",
                "Glass bottles",
                "Plastic bottles",
                "Aluminum cans",
                "Cardboard boxes",
                "Aluminum foil",
                "Metal items",
                "Pens",
                "Pencils",
            ],
        ),
        category(
            "hazardous",
            "Hazardous Waste",
            "⚠️",
            "bg-error-500",
            "from-error-400 to-error-600",
            "Dangerous Materials",
            &[
                "Batteries",
                "Paint",
                "Pesticides",
                "Medical waste",
                "Scissors",
                "Injections",
                "Syringes",
                "Sharp objects",
            ],
        ),
        category(
            "solid",
            "Solid Waste",
            "🗑️",
            "bg-gray-600",
            "from-gray-500 to-gray-700",
            "Non-recyclable Items",
            &[
                "Broken toys",
                "Used tissue",
                "Old shoes",
                "Styrofoam",
                "Mixed material items",
            ],
        ),
        category(
            "organic",
            "Organic Waste",
            "🌱",
            "bg-secondary-500",
            "from-secondary-400 to-secondary-600",
            "Biodegradable Waste",
            &["Fruit peels", "Vegetable scraps", "Leaves", "Food leftovers"],
        ),
    ]
}

/// Placeholder for text that names none of the bins
pub fn unclassified() -> WasteCategory {
    category(
        "unknown",
        "Unclassified Waste",
        "❓",
        "bg-gray-500",
        "from-gray-400 to-gray-600",
        "No matching category",
        &[],
    )
}

/// Map a model-written category ("Recyclable Waste", "organic") onto the catalog
///
/// A category matches when the lower-cased text contains its id or its full
/// name; the first match in catalog order wins.
pub fn match_category(text: &str) -> WasteCategory {
    let lowered = text.to_lowercase();
    waste_categories()
        .into_iter()
        .find(|c| lowered.contains(&c.id) || lowered.contains(&c.name.to_lowercase()))
        .unwrap_or_else(unclassified)
}

/// Decoration synthesized for a raw model label with no catalog entry
pub fn generated_category(label: &str) -> WasteCategory {
    category(
        &label.to_lowercase().replace(' ', "_"),
        label,
        "🔍",
        "bg-gray-500",
        "from-gray-400 to-gray-600",
        "AI generated category",
        &[],
    )
}
