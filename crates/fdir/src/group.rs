//! RedundancyGroup - N input endpoints and one output endpoint of a kind

use contracts::{Direction, HubBlueprint, SensorKind, MAX_REDUNDANCY};
use tracing::{info, instrument};
use transport::Endpoint;

use crate::FdirError;

/// Redundancy group of one sensor kind
///
/// Inputs are ordered by copy index; index 0 is the nominal primary.
#[derive(Debug)]
pub struct RedundancyGroup {
    kind: SensorKind,
    inputs: Vec<Endpoint>,
    output: Endpoint,
}

impl RedundancyGroup {
    /// Open every endpoint of `kind` described by the blueprint
    ///
    /// Fails on the first endpoint that cannot be opened; endpoints opened
    /// before it are released.
    #[instrument(name = "redundancy_group_open", skip(blueprint), fields(sensor = %kind))]
    pub async fn open(kind: SensorKind, blueprint: &HubBlueprint) -> Result<Self, FdirError> {
        let config = |source| FdirError::Config { kind, source };
        let input_configs = blueprint.input_endpoints(kind).map_err(config)?;
        let output_config = blueprint.output_endpoint(kind).map_err(config)?;
        check_redundancy(kind, input_configs.len())?;

        let mut inputs = Vec::with_capacity(input_configs.len());
        for endpoint in &input_configs {
            let opened = Endpoint::open(endpoint)
                .await
                .map_err(|source| FdirError::Endpoint { kind, source })?;
            inputs.push(opened);
        }
        let output = Endpoint::open(&output_config)
            .await
            .map_err(|source| FdirError::Endpoint { kind, source })?;

        info!(
            sensor = %kind,
            redundancy = inputs.len(),
            output = %output_config.address,
            "Redundancy group opened"
        );

        Self::from_endpoints(kind, inputs, output)
    }

    /// Assemble a group from already opened endpoints
    pub fn from_endpoints(
        kind: SensorKind,
        inputs: Vec<Endpoint>,
        output: Endpoint,
    ) -> Result<Self, FdirError> {
        check_redundancy(kind, inputs.len())?;

        let misdirected = inputs
            .iter()
            .find(|e| e.direction() != Direction::Input)
            .or((output.direction() != Direction::Output).then_some(&output));
        if let Some(endpoint) = misdirected {
            return Err(FdirError::MisdirectedEndpoint {
                kind,
                endpoint: endpoint.label().to_string(),
            });
        }

        Ok(Self {
            kind,
            inputs,
            output,
        })
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Configured cardinality N
    pub fn redundancy(&self) -> usize {
        self.inputs.len()
    }

    pub fn input(&self, index: usize) -> Option<&Endpoint> {
        self.inputs.get(index)
    }

    pub fn inputs(&self) -> &[Endpoint] {
        &self.inputs
    }

    pub fn output(&self) -> &Endpoint {
        &self.output
    }

    /// Close every endpoint
    pub fn close(&mut self) {
        self.inputs.iter_mut().for_each(Endpoint::close);
        self.output.close();
    }
}

fn check_redundancy(kind: SensorKind, count: usize) -> Result<(), FdirError> {
    if count == 0 || count > MAX_REDUNDANCY {
        return Err(FdirError::InvalidRedundancy { kind, count });
    }
    Ok(())
}
