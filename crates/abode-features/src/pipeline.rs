//! Ordered transform pipelines with schema contracts.

use crate::error::{FeatureError, Result};
use crate::transform::Transform;
use abode_data::Observations;
use serde::{Deserialize, Serialize};

/// Stage label for checks against the declared input schema.
const INPUT_STAGE: &str = "pipeline input";

/// An explicit, ordered list of transforms.
///
/// Every step's column contract is checked against the running schema when
/// the pipeline is built, so a misconfigured pipeline never reaches data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PipelineSpec", into = "PipelineSpec")]
pub struct FeaturePipeline {
    input_schema: Vec<String>,
    steps: Vec<Transform>,
    output_schema: Vec<String>,
}

/// Serialized form of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineSpec {
    input_schema: Vec<String>,
    steps: Vec<Transform>,
}

impl TryFrom<PipelineSpec> for FeaturePipeline {
    type Error = FeatureError;

    fn try_from(spec: PipelineSpec) -> Result<Self> {
        Self::new(spec.input_schema, spec.steps)
    }
}

impl From<FeaturePipeline> for PipelineSpec {
    fn from(pipeline: FeaturePipeline) -> Self {
        Self {
            input_schema: pipeline.input_schema,
            steps: pipeline.steps,
        }
    }
}

impl FeaturePipeline {
    /// Build a pipeline over tables carrying at least `input_schema`.
    pub fn new<S: Into<String>>(
        input_schema: impl IntoIterator<Item = S>,
        steps: Vec<Transform>,
    ) -> Result<Self> {
        let input_schema: Vec<String> = input_schema.into_iter().map(Into::into).collect();

        let mut schema = input_schema.clone();
        for step in &steps {
            step.validate()?;
            schema = step.output_schema(&schema)?;
        }

        Ok(Self {
            input_schema,
            steps,
            output_schema: schema,
        })
    }

    /// Columns an input table must carry.
    pub fn input_schema(&self) -> &[String] {
        &self.input_schema
    }

    /// Columns of every output table, in order.
    pub fn output_schema(&self) -> &[String] {
        &self.output_schema
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Transform] {
        &self.steps
    }

    /// Number of steps.
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps.
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a step, checking it against the current output schema.
    pub fn then(mut self, step: impl Into<Transform>) -> Result<Self> {
        let step = step.into();
        step.validate()?;
        self.output_schema = step.output_schema(&self.output_schema)?;
        self.steps.push(step);
        Ok(self)
    }

    /// Run every step in order.
    ///
    /// Columns beyond the input schema are carried through until a selection
    /// removes them.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        if let Some(missing) = self.input_schema.iter().find(|c| !table.has_column(c)) {
            return Err(FeatureError::MissingColumn {
                stage: INPUT_STAGE.to_string(),
                column: missing.clone(),
            });
        }

        let mut current = table.clone();
        for step in &self.steps {
            current = step.apply(&current)?;
            tracing::trace!(stage = %step.stage(), columns = current.columns().len(), "applied transform");
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative::Derivatives;
    use crate::periodic::PeriodicExpansion;
    use crate::select::SelectFeatures;
    use crate::smooth::{SavgolFilter, SmoothingConfig};
    use abode_data::calendar::month_end_from_index;

    fn raw(rows: usize) -> Observations {
        let dates = (0..rows as i64)
            .map(|i| month_end_from_index(24_150 + i).unwrap())
            .collect();
        Observations::new(dates)
            .with_column("apr", (0..rows).map(|i| 0.04 + 0.001 * i as f64).collect())
            .unwrap()
            .with_column("hpi_sa", (0..rows).map(|i| 240.0 + i as f64).collect())
            .unwrap()
    }

    fn preprocessing() -> FeaturePipeline {
        let smoothing = SmoothingConfig::default();
        FeaturePipeline::new(
            ["apr", "hpi_sa"],
            vec![
                SavgolFilter::new("apr", smoothing).unwrap().into(),
                SavgolFilter::new("hpi_sa", smoothing).unwrap().into(),
                Derivatives::new("apr_savgol", 2).unwrap().into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_output_schema_is_declared() {
        let pipeline = preprocessing();
        assert_eq!(
            pipeline.output_schema(),
            &[
                "apr",
                "hpi_sa",
                "apr_savgol",
                "hpi_sa_savgol",
                "apr_savgol_div_1",
                "apr_savgol_div_2"
            ]
        );
        let out = pipeline.apply(&raw(20)).unwrap();
        assert_eq!(out.column_names(), pipeline.output_schema());
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn test_construction_rejects_missing_column() {
        let result = FeaturePipeline::new(
            ["apr"],
            vec![Derivatives::new("apr_savgol", 1).unwrap().into()],
        );
        match result {
            Err(FeatureError::MissingColumn { stage, column }) => {
                assert_eq!(stage, "differentiate(apr_savgol)");
                assert_eq!(column, "apr_savgol");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_rejects_table_without_input_schema() {
        let table = raw(20);
        let pipeline = FeaturePipeline::new(["fmr"], Vec::new()).unwrap();
        assert!(matches!(
            pipeline.apply(&table),
            Err(FeatureError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_then_extends_schema() {
        let pipeline = FeaturePipeline::new(["apr", "hpi_sa"], Vec::new())
            .unwrap()
            .then(SelectFeatures::new(["apr"]).unwrap())
            .unwrap()
            .then(PeriodicExpansion::new(1))
            .unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline.output_schema(),
            &["apr", "sin1_month", "cos1_month"]
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"input_schema":["apr"],"steps":[{"kind":"differentiate","column":"hpi","order":1}]}"#;
        assert!(serde_json::from_str::<FeaturePipeline>(json).is_err());

        let json = r#"{"input_schema":["apr"],"steps":[{"kind":"differentiate","column":"apr","order":2}]}"#;
        let pipeline: FeaturePipeline = serde_json::from_str(json).unwrap();
        assert_eq!(pipeline.output_schema().len(), 3);
    }
}
