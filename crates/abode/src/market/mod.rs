//! Market definitions.
//!
//! A market fixes which raw features feed the preprocessing pipeline, which
//! preprocessed columns the segment models see, and which target they predict.

pub mod model;

pub use model::MarketModel;

use crate::error::{MarketError, Result};
use abode_data::loaders::{HPI_SA, LISTING_PRICE, RENTAL_PRICE};
use abode_data::{HousingTable, Observations};
use abode_features::{
    Derivatives, FeatureError, FeaturePipeline, SAVGOL_SUFFIX, SavgolFilter, Transform,
};
use abode_model::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mortgage-rate column.
pub const APR: &str = abode_data::loaders::APR;

/// Fair-market-rent index column.
pub const FMR: &str = abode_data::loaders::FMR;

/// Which housing market a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Median listing prices, in thousands
    Price,
    /// Median rental prices
    Rent,
}

impl Market {
    /// Every market.
    pub const fn all() -> [Self; 2] {
        [Self::Price, Self::Rent]
    }

    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Rent => "rent",
        }
    }

    /// Target column.
    pub const fn target(&self) -> &'static str {
        match self {
            Self::Price => LISTING_PRICE,
            Self::Rent => RENTAL_PRICE,
        }
    }

    /// Columns a raw feature table must carry.
    pub const fn raw_features(&self) -> &'static [&'static str] {
        match self {
            Self::Price => &[APR, HPI_SA],
            Self::Rent => &[APR, HPI_SA, FMR],
        }
    }

    /// Preprocessed columns the segment models are fitted on.
    pub fn fit_features(&self) -> Vec<String> {
        let apr = format!("{APR}{SAVGOL_SUFFIX}");
        let apr_slope = abode_features::derivative_column(&apr, 1);
        match self {
            Self::Price => vec![apr, format!("{HPI_SA}{SAVGOL_SUFFIX}"), apr_slope],
            Self::Rent => vec![FMR.to_string(), apr, apr_slope],
        }
    }

    /// Preprocessing pipeline over this market's raw features.
    ///
    /// Smooths the mortgage rate and house price index, then differentiates
    /// the smoothed rate up to `config.derivative_order`. Fails if the
    /// resulting schema lacks a fit feature.
    pub fn preprocessing(&self, config: &ModelConfig) -> Result<FeaturePipeline> {
        let pipeline = macro_pipeline(self.raw_features(), config)?;
        if let Some(missing) = self
            .fit_features()
            .into_iter()
            .find(|f| !pipeline.output_schema().contains(f))
        {
            return Err(FeatureError::MissingColumn {
                stage: format!("{self} features"),
                column: missing,
            }
            .into());
        }
        Ok(pipeline)
    }

    /// This market's targets from the county price table.
    pub fn targets(&self, housing: &HousingTable) -> Result<Observations> {
        Ok(match self {
            Self::Price => housing.listing_targets()?,
            Self::Rent => housing.rental_targets()?,
        })
    }
}

/// Smoothing and differencing over `inputs`, which must include the mortgage
/// rate and house price index.
pub(crate) fn macro_pipeline(inputs: &[&str], config: &ModelConfig) -> Result<FeaturePipeline> {
    let mut steps: Vec<Transform> = vec![
        SavgolFilter::new(APR, config.smoothing)?.into(),
        SavgolFilter::new(HPI_SA, config.smoothing)?.into(),
    ];
    if config.derivative_order > 0 {
        steps.push(
            Derivatives::new(format!("{APR}{SAVGOL_SUFFIX}"), config.derivative_order)?.into(),
        );
    }
    Ok(FeaturePipeline::new(inputs.iter().copied(), steps)?)
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Market {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" | "prices" | "listing" => Ok(Self::Price),
            "rent" | "rents" | "rental" => Ok(Self::Rent),
            other => Err(MarketError::UnknownMarket(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("price", Market::Price)]
    #[case("Rent", Market::Rent)]
    #[case(" listing ", Market::Price)]
    fn test_parse_market(#[case] input: &str, #[case] expected: Market) {
        assert_eq!(input.parse::<Market>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_market() {
        assert!(matches!(
            "condo".parse::<Market>(),
            Err(MarketError::UnknownMarket(name)) if name == "condo"
        ));
    }

    #[test]
    fn test_fit_features() {
        assert_eq!(
            Market::Price.fit_features(),
            vec!["apr_savgol", "hpi_sa_savgol", "apr_savgol_div_1"]
        );
        assert_eq!(
            Market::Rent.fit_features(),
            vec!["fmr", "apr_savgol", "apr_savgol_div_1"]
        );
        assert_eq!(Market::Rent.target(), "RentalPrice");
    }

    #[test]
    fn test_preprocessing_schema() {
        let pipeline = Market::Rent.preprocessing(&ModelConfig::default()).unwrap();
        assert_eq!(pipeline.input_schema(), &["apr", "hpi_sa", "fmr"]);
        for feature in Market::Rent.fit_features() {
            assert!(pipeline.output_schema().contains(&feature));
        }
        assert!(pipeline.output_schema().contains(&"apr_savgol_div_2".to_string()));
    }

    #[test]
    fn test_preprocessing_without_derivatives_misses_slope() {
        let config = ModelConfig {
            derivative_order: 0,
            ..Default::default()
        };
        assert!(matches!(
            Market::Price.preprocessing(&config),
            Err(MarketError::Feature(FeatureError::MissingColumn { column, .. }))
                if column == "apr_savgol_div_1"
        ));
    }

    #[test]
    fn test_serde_name() {
        assert_eq!(serde_json::to_string(&Market::Rent).unwrap(), "\"rent\"");
    }
}
