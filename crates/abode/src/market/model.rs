//! A market bound to its data, preprocessing and fitted segment models.

use super::{Market, macro_pipeline};
use crate::error::Result;
use abode_data::loaders::{APR, HPI_SA};
use abode_data::{
    DataPaths, JoinValidation, LoaderConfig, Observations, SegmentKey, load_fair_market_rents,
    load_house_price_index, load_housing_by_density, load_mortgage_rates,
};
use abode_features::FeaturePipeline;
use abode_model::{
    FitEvent, FitReport, FittedSegmentModel, ModelConfig, Prediction, Predictor, SegmentFitter,
    SegmentModels,
};

/// Training data, preprocessing and fitted models of one market.
///
/// Built once from tables or loaded files. [`Self::fit_all`] replaces the
/// fitted models; [`Self::predict`] only reads them.
#[derive(Debug, Clone)]
pub struct MarketModel {
    market: Market,
    config: ModelConfig,
    preprocessing: FeaturePipeline,
    raw_features: Observations,
    features: Observations,
    training: Observations,
    models: SegmentModels,
}

impl MarketModel {
    /// Preprocess `raw_features` and join them to segmented `targets` on date.
    ///
    /// `raw_features` must carry [`Market::raw_features`]; `targets` must
    /// carry [`Market::target`] and at most one row per (date, segment).
    pub fn from_tables(
        market: Market,
        raw_features: Observations,
        targets: &Observations,
        config: ModelConfig,
    ) -> Result<Self> {
        let preprocessing = market.preprocessing(&config)?;
        let features = preprocessing.apply(&raw_features)?;
        Self::assemble(market, config, preprocessing, raw_features, features, targets)
    }

    /// Load every dataset the market needs and build the model.
    ///
    /// Rent features smooth the mortgage rate and house price index over their
    /// full history before the fair-market-rent index is attached.
    pub fn load(
        market: Market,
        paths: &DataPaths,
        loader: &LoaderConfig,
        config: ModelConfig,
    ) -> Result<Self> {
        let housing = load_housing_by_density(paths, loader)?;
        let targets = market.targets(&housing)?;

        let rates = load_mortgage_rates(&paths.mortgage_rates)?;
        let hpi = load_house_price_index(&paths.hpi_master, &loader.hpi_place)?;
        let macro_raw = rates.join_on_date(&hpi.select(&[HPI_SA])?, JoinValidation::ManyToOne)?;
        tracing::info!(
            market = %market,
            targets = targets.len(),
            feature_months = macro_raw.len(),
            counties = housing.counties().len(),
            "loaded market data"
        );

        match market {
            Market::Price => Self::from_tables(market, macro_raw, &targets, config),
            Market::Rent => {
                let fmr = load_fair_market_rents(&paths.fair_market_rents, housing.counties())?
                    .index()?;
                let preprocessing = market.preprocessing(&config)?;
                let features = macro_pipeline(&[APR, HPI_SA], &config)?
                    .apply(&macro_raw)?
                    .join_on_date(&fmr, JoinValidation::ManyToOne)?;
                let raw_features = macro_raw.join_on_date(&fmr, JoinValidation::ManyToOne)?;
                Self::assemble(market, config, preprocessing, raw_features, features, &targets)
            }
        }
    }

    fn assemble(
        market: Market,
        config: ModelConfig,
        preprocessing: FeaturePipeline,
        raw_features: Observations,
        features: Observations,
        targets: &Observations,
    ) -> Result<Self> {
        targets.validate_unique_keys()?;
        let target = targets.select(&[market.target()])?;
        let training = target.join_on_date(&features, JoinValidation::ManyToOne)?;
        tracing::debug!(market = %market, rows = training.len(), "joined targets to features");

        Ok(Self {
            market,
            config,
            preprocessing,
            raw_features,
            features,
            training,
            models: SegmentModels::default(),
        })
    }

    /// Market definition.
    pub const fn market(&self) -> Market {
        self.market
    }

    /// Model configuration.
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Shared preprocessing pipeline.
    pub const fn preprocessing(&self) -> &FeaturePipeline {
        &self.preprocessing
    }

    /// Raw features the model was built from.
    pub const fn raw_features(&self) -> &Observations {
        &self.raw_features
    }

    /// Preprocessed training features, one row per month.
    pub const fn features(&self) -> &Observations {
        &self.features
    }

    /// Targets joined to preprocessed features, one row per (month, segment).
    pub const fn training_table(&self) -> &Observations {
        &self.training
    }

    /// Training rows of one segment.
    pub fn segment_rows(&self, key: SegmentKey) -> Result<Observations> {
        Ok(self.training.filter_segment(key)?)
    }

    /// Fitted models; empty until [`Self::fit_all`] runs.
    pub const fn models(&self) -> &SegmentModels {
        &self.models
    }

    /// Fit every segment, replacing previously fitted models.
    pub fn fit_all(&mut self) -> Result<FitReport> {
        self.fit_all_with_progress(|_, _| {})
    }

    /// [`Self::fit_all`], calling `progress` after each segment.
    pub fn fit_all_with_progress<F>(&mut self, progress: F) -> Result<FitReport>
    where
        F: FnMut(SegmentKey, FitEvent<'_>),
    {
        let fitter = SegmentFitter::new(self.config.clone())?;
        let (models, report) = fitter.fit_all_with_progress(
            &self.training,
            self.market.target(),
            &self.market.fit_features(),
            progress,
        )?;
        self.models = models;
        Ok(report)
    }

    /// Fitted model of a segment.
    pub fn get_model(&self, bedrooms: i64, density_code: i64) -> Result<&FittedSegmentModel> {
        Ok(self.models.get_model(bedrooms, density_code)?)
    }

    /// Predict every segment for each row of raw `features`.
    pub fn predict(&self, features: &Observations) -> Result<Vec<Prediction>> {
        Ok(Predictor::new(&self.preprocessing, &self.models).predict(features)?)
    }
}
