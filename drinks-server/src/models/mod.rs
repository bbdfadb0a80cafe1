use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A single recipe component
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name, withheld from the public listing
    pub name: String,
    /// Display color used when drawing the drink
    pub color: String,
    /// Number of parts of this ingredient
    pub parts: u32,
}

/// Ordered ingredients of a drink.
///
/// A bare ingredient object is accepted and treated as a one-element recipe.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Recipe(pub Vec<Ingredient>);

impl<'de> Deserialize<'de> for Recipe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RecipeInput {
            Many(Vec<Ingredient>),
            One(Ingredient),
        }

        Ok(match RecipeInput::deserialize(deserializer)? {
            RecipeInput::Many(ingredients) => Recipe(ingredients),
            RecipeInput::One(ingredient) => Recipe(vec![ingredient]),
        })
    }
}

impl Recipe {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialized form stored in the `recipe` column
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// A persisted drink. Serializes as the long view.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Recipe,
}

/// Public ingredient view without the name
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct IngredientShort {
    pub color: String,
    pub parts: u32,
}

/// Public drink view
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientShort>,
}

impl Drink {
    pub fn short(&self) -> DrinkShort {
        DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .0
                .iter()
                .map(|ingredient| IngredientShort {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

/// Validated values for a new row
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

/// Fields to change on an existing row; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

/// Body of `POST /drinks`
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDrink {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl CreateDrink {
    /// Both fields must be present and non-empty
    pub fn validate(self) -> Result<NewDrink, &'static str> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err("title is required"),
        };
        let recipe = match self.recipe {
            Some(recipe) if !recipe.is_empty() => recipe,
            _ => return Err("recipe is required"),
        };
        Ok(NewDrink { title, recipe })
    }
}

/// Body of `PATCH /drinks/{id}`
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDrink {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl UpdateDrink {
    pub fn validate(self) -> Result<DrinkPatch, &'static str> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err("title must not be empty");
        }
        if matches!(&self.recipe, Some(recipe) if recipe.is_empty()) {
            return Err("recipe must not be empty");
        }
        Ok(DrinkPatch {
            title: self.title,
            recipe: self.recipe,
        })
    }
}

/// Response carrying the public view of drinks
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrinksShortResponse {
    pub success: bool,
    pub drinks: Vec<DrinkShort>,
}

/// Response carrying the detailed view of drinks
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i64,
}
