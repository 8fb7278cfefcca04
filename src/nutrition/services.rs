use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::dto::{NutritionEstimate, RawEstimate};
use crate::{error::AppError, llm::CompletionClient};

/// Calories per gram.
pub const PROTEIN_KCAL_PER_G: f64 = 4.0;
pub const CARBS_KCAL_PER_G: f64 = 4.0;
pub const FAT_KCAL_PER_G: f64 = 9.0;
pub const ALCOHOL_KCAL_PER_G: f64 = 7.0;

/// Allowed distance of the percent sum from 100 before recomputation.
pub const PERCENT_TOLERANCE: f64 = 5.0;

/// A macro's share of total calories lies in `[0, 100]`.
pub fn percent_in_range(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

fn first_out_of_range(e: &NutritionEstimate) -> Option<&'static str> {
    [
        ("proteinPercent", e.protein_percent),
        ("carbsPercent", e.carbs_percent),
        ("fatPercent", e.fat_percent),
        ("alcoholPercent", e.alcohol_percent),
    ]
    .into_iter()
    .find(|(_, v)| !percent_in_range(*v))
    .map(|(field, _)| field)
}

const SYSTEM_PROMPT: &str = r#"You are a nutrition expert. Analyze the food description and provide detailed nutritional information.
Calculate the macronutrient percentages based on total calories (protein: 4 cal/g, carbs: 4 cal/g, fat: 9 cal/g, alcohol: 7 cal/g).
Respond with JSON in this exact format: {
  "name": "string (concise food name)",
  "calories": number,
  "protein": number (grams),
  "carbs": number (grams),
  "fat": number (grams),
  "alcohol": number (grams, 0 if no alcohol),
  "proteinPercent": number (percentage of total calories from protein),
  "carbsPercent": number (percentage of total calories from carbs),
  "fatPercent": number (percentage of total calories from fat),
  "alcoholPercent": number (percentage of total calories from alcohol)
}"#;

/// Turns free-text food descriptions into validated nutrition estimates.
#[derive(Clone)]
pub struct NutritionEstimator {
    client: Arc<dyn CompletionClient>,
}

impl NutritionEstimator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// One outbound call per invocation, no retries.
    #[instrument(skip(self))]
    pub async fn estimate(&self, description: &str) -> Result<NutritionEstimate, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Food description is required".into()));
        }

        let user = format!("Analyze this food: {description}");
        let raw = self.client.complete_json(SYSTEM_PROMPT, &user).await?;
        debug!(bytes = raw.len(), "raw estimate received");

        let estimate = parse_estimate(&raw)?;
        reconcile(estimate)
    }
}

/// Strictly decodes the service output; nothing is defaulted.
pub fn parse_estimate(raw: &str) -> Result<NutritionEstimate, AppError> {
    let r: RawEstimate = serde_json::from_str(raw)
        .map_err(|e| AppError::Estimation(format!("Invalid nutrition analysis response: {e}")))?;

    let name = r.name.trim();
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }

    let calories = r.calories.round();
    if !(0.0..=f64::from(i32::MAX)).contains(&calories) {
        return Err(invalid("calories out of range"));
    }

    for (field, grams) in [
        ("protein", r.protein),
        ("carbs", r.carbs),
        ("fat", r.fat),
        ("alcohol", r.alcohol),
    ] {
        if grams < 0.0 {
            return Err(invalid(&format!("{field} is negative")));
        }
    }

    let estimate = NutritionEstimate {
        name: name.to_string(),
        calories: calories as i32,
        protein: r.protein,
        carbs: r.carbs,
        fat: r.fat,
        alcohol: r.alcohol,
        protein_percent: r.protein_percent,
        carbs_percent: r.carbs_percent,
        fat_percent: r.fat_percent,
        alcohol_percent: r.alcohol_percent,
    };
    if let Some(field) = first_out_of_range(&estimate) {
        return Err(invalid(&format!("{field} is outside 0..=100")));
    }
    Ok(estimate)
}

fn invalid(detail: &str) -> AppError {
    AppError::Estimation(format!("Invalid nutrition analysis response: {detail}"))
}

/// Recomputes the percent fields from grams when their sum is off by more
/// than [`PERCENT_TOLERANCE`]. Grams are never touched.
pub fn reconcile(mut e: NutritionEstimate) -> Result<NutritionEstimate, AppError> {
    let sum = e.percent_sum();
    if (sum - 100.0).abs() <= PERCENT_TOLERANCE {
        return Ok(e);
    }

    if e.calories == 0 {
        return Err(AppError::Estimation(
            "zero-calorie estimate with inconsistent macro percentages".into(),
        ));
    }

    let total = f64::from(e.calories);
    let share = |grams: f64, kcal_per_g: f64| (grams * kcal_per_g / total * 100.0).round();
    e.protein_percent = share(e.protein, PROTEIN_KCAL_PER_G);
    e.carbs_percent = share(e.carbs, CARBS_KCAL_PER_G);
    e.fat_percent = share(e.fat, FAT_KCAL_PER_G);
    e.alcohol_percent = share(e.alcohol, ALCOHOL_KCAL_PER_G);
    if let Some(field) = first_out_of_range(&e) {
        return Err(AppError::Estimation(format!(
            "macro grams exceed stated calories ({field} above 100)"
        )));
    }

    info!(
        reported_sum = sum,
        recomputed_sum = e.percent_sum(),
        "macro percentages recomputed from grams"
    );
    Ok(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClient {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(msg.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete_json(&self, _system: &str, _user: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(AppError::Estimation)
        }
    }

    fn estimate(percents: [f64; 4]) -> NutritionEstimate {
        NutritionEstimate {
            name: "Chicken wrap".into(),
            calories: 350,
            protein: 20.0,
            carbs: 30.0,
            fat: 10.0,
            alcohol: 0.0,
            protein_percent: percents[0],
            carbs_percent: percents[1],
            fat_percent: percents[2],
            alcohol_percent: percents[3],
        }
    }

    #[tokio::test]
    async fn blank_description_makes_no_call() {
        let client = ScriptedClient::ok("{}");
        let estimator = NutritionEstimator::new(client.clone());

        for input in ["", "   ", "\t\n"] {
            let err = estimator.estimate(input).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn consistent_percentages_pass_through() {
        let client = ScriptedClient::ok(
            r#"{"name":"Oatmeal","calories":150,"protein":5,"carbs":27,"fat":2.5,"alcohol":0,
                "proteinPercent":13,"carbsPercent":72,"fatPercent":15,"alcoholPercent":0}"#,
        );
        let estimator = NutritionEstimator::new(client.clone());

        let e = estimator.estimate("a bowl of oatmeal").await.unwrap();
        assert_eq!(e.name, "Oatmeal");
        assert_eq!(e.calories, 150);
        assert_eq!(e.protein_percent, 13.0);
        assert_eq!(e.carbs_percent, 72.0);
        assert_eq!(e.fat_percent, 15.0);
        assert_eq!(e.alcohol_percent, 0.0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inconsistent_percentages_are_recomputed() {
        let client = ScriptedClient::ok(
            r#"{"name":"Chicken wrap","calories":350,"protein":20,"carbs":30,"fat":10,"alcohol":0,
                "proteinPercent":10,"carbsPercent":10,"fatPercent":10,"alcoholPercent":0}"#,
        );
        let e = NutritionEstimator::new(client)
            .estimate("chicken wrap")
            .await
            .unwrap();

        assert_eq!(e.protein_percent, 23.0);
        assert_eq!(e.carbs_percent, 34.0);
        assert_eq!(e.fat_percent, 26.0);
        assert_eq!(e.alcohol_percent, 0.0);
        assert_eq!((e.protein, e.carbs, e.fat, e.alcohol), (20.0, 30.0, 10.0, 0.0));
    }

    #[tokio::test]
    async fn service_failure_is_surfaced_once() {
        let client = ScriptedClient::failing("AI service unreachable");
        let estimator = NutritionEstimator::new(client.clone());

        let err = estimator.estimate("pizza").await.unwrap_err();
        assert!(matches!(err, AppError::Estimation(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let low = reconcile(estimate([30.0, 40.0, 25.0, 0.0])).unwrap();
        assert_eq!(low.percent_sum(), 95.0);
        assert_eq!(low.protein_percent, 30.0);

        let high = reconcile(estimate([30.0, 50.0, 25.0, 0.0])).unwrap();
        assert_eq!(high.percent_sum(), 105.0);
        assert_eq!(high.carbs_percent, 50.0);
    }

    #[test]
    fn just_outside_tolerance_recomputes() {
        let e = reconcile(estimate([30.0, 50.0, 25.5, 0.0])).unwrap();
        assert_eq!(e.protein_percent, 23.0);
        assert_eq!(e.carbs_percent, 34.0);
        assert_eq!(e.fat_percent, 26.0);
    }

    #[test]
    fn alcohol_uses_seven_kcal_per_gram() {
        let beer = NutritionEstimate {
            name: "Lager".into(),
            calories: 150,
            protein: 1.5,
            carbs: 13.0,
            fat: 0.0,
            alcohol: 14.0,
            protein_percent: 0.0,
            carbs_percent: 0.0,
            fat_percent: 0.0,
            alcohol_percent: 0.0,
        };
        let e = reconcile(beer).unwrap();
        // 14 * 7 / 150 * 100 = 65.33
        assert_eq!(e.alcohol_percent, 65.0);
        // 13 * 4 / 150 * 100 = 34.67
        assert_eq!(e.carbs_percent, 35.0);
        assert_eq!(e.protein_percent, 4.0);
    }

    #[test]
    fn zero_calories_needing_recompute_is_an_error() {
        let mut e = estimate([0.0, 0.0, 0.0, 0.0]);
        e.calories = 0;
        assert!(matches!(reconcile(e), Err(AppError::Estimation(_))));
    }

    #[test]
    fn zero_calories_with_consistent_percentages_is_kept() {
        let mut e = estimate([25.0, 25.0, 25.0, 25.0]);
        e.calories = 0;
        assert_eq!(reconcile(e).unwrap().calories, 0);
    }

    #[test]
    fn parse_rejects_missing_name_and_non_numeric_calories() {
        let no_name = r#"{"calories":100,"protein":1,"carbs":1,"fat":1,"alcohol":0,
            "proteinPercent":25,"carbsPercent":25,"fatPercent":50,"alcoholPercent":0}"#;
        assert!(matches!(parse_estimate(no_name), Err(AppError::Estimation(_))));

        let blank_name = r#"{"name":"  ","calories":100,"protein":1,"carbs":1,"fat":1,"alcohol":0,
            "proteinPercent":25,"carbsPercent":25,"fatPercent":50,"alcoholPercent":0}"#;
        assert!(matches!(parse_estimate(blank_name), Err(AppError::Estimation(_))));

        let string_calories = r#"{"name":"Toast","calories":"100","protein":1,"carbs":1,"fat":1,"alcohol":0,
            "proteinPercent":25,"carbsPercent":25,"fatPercent":50,"alcoholPercent":0}"#;
        assert!(matches!(parse_estimate(string_calories), Err(AppError::Estimation(_))));
    }

    #[test]
    fn parse_requires_every_field() {
        let no_alcohol = r#"{"name":"Toast","calories":100,"protein":1,"carbs":1,"fat":1,
            "proteinPercent":25,"carbsPercent":25,"fatPercent":50,"alcoholPercent":0}"#;
        assert!(parse_estimate(no_alcohol).is_err());
        assert!(parse_estimate("not json at all").is_err());
    }

    #[test]
    fn parse_rejects_percentages_outside_zero_to_hundred() {
        // sums to 100, so the tolerance check alone would keep it
        let skewed = r#"{"name":"Toast","calories":100,"protein":3,"carbs":18,"fat":1,"alcohol":0,
            "proteinPercent":-50,"carbsPercent":150,"fatPercent":0,"alcoholPercent":0}"#;
        let err = parse_estimate(skewed).unwrap_err();
        assert!(matches!(err, AppError::Estimation(ref m) if m.contains("proteinPercent")));

        let over = r#"{"name":"Toast","calories":100,"protein":3,"carbs":18,"fat":1,"alcohol":0,
            "proteinPercent":0,"carbsPercent":0,"fatPercent":0,"alcoholPercent":100.5}"#;
        assert!(matches!(parse_estimate(over), Err(AppError::Estimation(_))));

        let bounds = r#"{"name":"Water","calories":1,"protein":0.25,"carbs":0,"fat":0,"alcohol":0,
            "proteinPercent":100,"carbsPercent":0,"fatPercent":0,"alcoholPercent":0}"#;
        assert_eq!(parse_estimate(bounds).unwrap().protein_percent, 100.0);
    }

    #[test]
    fn recomputed_share_above_hundred_is_an_error() {
        // 40 g protein is 160 kcal, more than the stated 100
        let mut e = estimate([0.0, 0.0, 0.0, 0.0]);
        e.calories = 100;
        e.protein = 40.0;
        e.carbs = 0.0;
        e.fat = 0.0;
        assert!(matches!(reconcile(e), Err(AppError::Estimation(_))));
    }

    #[test]
    fn parse_rounds_calories_and_rejects_negatives() {
        let fractional = r#"{"name":"Toast","calories":99.6,"protein":3,"carbs":18,"fat":1,"alcohol":0,
            "proteinPercent":12,"carbsPercent":72,"fatPercent":9,"alcoholPercent":0}"#;
        assert_eq!(parse_estimate(fractional).unwrap().calories, 100);

        let negative = r#"{"name":"Toast","calories":100,"protein":-3,"carbs":18,"fat":1,"alcohol":0,
            "proteinPercent":12,"carbsPercent":72,"fatPercent":9,"alcoholPercent":0}"#;
        assert!(parse_estimate(negative).is_err());

        let negative_kcal = r#"{"name":"Toast","calories":-5,"protein":3,"carbs":18,"fat":1,"alcohol":0,
            "proteinPercent":12,"carbsPercent":72,"fatPercent":9,"alcoholPercent":0}"#;
        assert!(parse_estimate(negative_kcal).is_err());
    }
}
