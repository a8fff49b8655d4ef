use crate::analysis::table::Table;
use crate::analysis::trajectory::Trajectory;
use crate::analysis::{acquire_rdfs, acquire_time_props};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// `Sample Time (ns)` followed by one column per requested property.
    pub properties: Table,
    /// Present only when RDF settings were supplied.
    pub rdfs: Option<Table>,
}

#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    trajectory: &Trajectory,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisReport, EngineError> {
    info!(
        n_atoms = trajectory.n_atoms(),
        n_frames = trajectory.n_frames(),
        n_residues = trajectory.n_residues(),
        "Analyzing trajectory"
    );

    // === Phase 1: Time series properties ===
    let calculations: Vec<_> = config.properties.iter().map(|kind| kind.calculation()).collect();
    let properties = reporter.phase("Computing properties", || {
        reporter.report(Progress::TaskStart {
            total_steps: calculations.len() as u64,
        });
        let mut table = acquire_time_props(trajectory, &trajectory.times(), Some("ns"), &[])?;
        for calculation in &calculations {
            table.insert_column(calculation.label(), calculation.compute(trajectory))?;
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        Ok::<_, EngineError>(table)
    })?;

    // === Phase 2: Radial distribution functions ===
    let rdfs = match &config.rdf {
        Some(rdf) => Some(reporter.phase("Computing radial distribution functions", || {
            acquire_rdfs(trajectory, None, rdf.min_radius, rdf.max_radius, rdf.bin_width)
        })?),
        None => None,
    };

    info!(
        n_properties = calculations.len(),
        n_rdfs = rdfs.as_ref().map_or(0, |t| t.n_columns().saturating_sub(1)),
        "Analysis complete"
    );
    Ok(AnalysisReport { properties, rdfs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;
    use crate::analysis::properties::PropertyKind;
    use crate::analysis::trajectory::Frame;
    use crate::core::models::element::Element;
    use crate::engine::config::{AnalysisConfigBuilder, RdfConfig};
    use nalgebra::{Point3, Vector3};

    fn water_pair(boxed: bool) -> Trajectory {
        let elements = ["O", "H", "H"]
            .iter()
            .map(|s| Element::from_symbol(s).unwrap())
            .collect();
        let frames = (0..3)
            .map(|i| Frame {
                time: i as f64 * 0.5,
                positions: vec![
                    Point3::origin(),
                    Point3::new(0.096, 0.0, 0.0),
                    Point3::new(-0.024, 0.093 + 0.001 * i as f64, 0.0),
                ],
                box_lengths: boxed.then(|| Vector3::new(2.0, 2.0, 2.0)),
            })
            .collect();
        Trajectory::new(elements, vec![0, 0, 0], frames).unwrap()
    }

    #[test]
    fn reports_requested_properties_and_rdfs() {
        let config = AnalysisConfigBuilder::new()
            .time_step(0.5)
            .properties(vec![PropertyKind::RadiusOfGyration])
            .rdf(RdfConfig::default())
            .build()
            .unwrap();
        let report = run(&water_pair(true), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(
            report.properties.labels().collect::<Vec<_>>(),
            ["Sample Time (ns)", "Radius of Gyration (Rg, nm)"]
        );
        assert_eq!(report.properties.column("Sample Time (ns)"), Some(&[0.0, 0.5, 1.0][..]));

        let rdfs = report.rdfs.unwrap();
        assert_eq!(rdfs.labels().collect::<Vec<_>>(), ["Radius (nm)", "g(r) (O-H)"]);
        assert_eq!(rdfs.n_rows(), 200);
    }

    #[test]
    fn rdf_without_box_is_an_analysis_error() {
        let config = AnalysisConfigBuilder::new()
            .time_step(0.5)
            .rdf(RdfConfig::default())
            .build()
            .unwrap();
        let result = run(&water_pair(false), &config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Analysis {
                source: AnalysisError::MissingUnitCell { frame: 0 }
            })
        ));
    }
}
