//! Question category and difficulty definitions

use serde::{Deserialize, Serialize};

/// Knowledge areas covered by the question bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Anatomy,
    Technique,
    Programming,
    Nutrition,
    Injury,
    Biomechanics,
}

impl Category {
    pub fn all() -> Vec<Category> {
        vec![
            Category::Anatomy,
            Category::Technique,
            Category::Programming,
            Category::Nutrition,
            Category::Injury,
            Category::Biomechanics,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anatomy => "anatomy",
            Category::Technique => "technique",
            Category::Programming => "programming",
            Category::Nutrition => "nutrition",
            Category::Injury => "injury",
            Category::Biomechanics => "biomechanics",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anatomy" => Ok(Category::Anatomy),
            "technique" => Ok(Category::Technique),
            "programming" => Ok(Category::Programming),
            "nutrition" => Ok(Category::Nutrition),
            "injury" | "injuries" => Ok(Category::Injury),
            "biomechanics" => Ok(Category::Biomechanics),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty levels for questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn all() -> Vec<Difficulty> {
        vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "1" => Ok(Difficulty::Easy),
            "medium" | "2" => Ok(Difficulty::Medium),
            "hard" | "3" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
