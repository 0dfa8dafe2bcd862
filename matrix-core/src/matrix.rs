// Matrix Driver
// Expands the cross-product of sweep axes into concrete benchmark invocations

use crate::catalog::{ExecutableSpec, PartitionParam, VariantCatalog};
use crate::error::{ConfigError, ConfigResult};
use crate::sweep::{Scenario, SweepAxes};
use crate::template::{Bindings, Placeholder, TemplateError};

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// One generated benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub command_line: String,
    pub output_path: PathBuf,
}

/// Coordinates of one point in the cross-product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepPoint<'a> {
    pub variant: &'a str,
    pub work: u64,
    pub thread: u32,
    pub partition: Option<PartitionParam>,
}

/// Everything resolved once per variant before iteration
#[derive(Debug, Clone)]
struct VariantPlan<'a> {
    id: &'a str,
    executable: ExecutableSpec,
    partition_flag: Option<&'a str>,
    threads: Vec<u32>,
}

impl VariantPlan<'_> {
    /// Partition values swept for this variant; `[None]` when the axis does not apply
    fn partitions(&self, axes: &SweepAxes) -> Vec<Option<PartitionParam>> {
        match self.partition_flag {
            Some(flag) if !axes.partitions.is_empty() => axes
                .partitions
                .iter()
                .map(|value| Some(PartitionParam::new(flag, *value)))
                .collect(),
            _ => vec![None],
        }
    }
}

/// Entry point for sweep generation
pub struct MatrixDriver;

impl MatrixDriver {
    /// Validate the whole configuration for this sweep and return a lazily
    /// rendered, re-iterable [`Sweep`].
    ///
    /// Unknown variants, unbindable placeholders and file-name templates that
    /// cannot tell two points apart all fail here, before any invocation exists.
    pub fn generate<'a>(
        scenario: &'a Scenario,
        catalog: &'a VariantCatalog,
        axes: &'a SweepAxes,
    ) -> ConfigResult<Sweep<'a>> {
        axes.validate()?;

        let mut plans = Vec::with_capacity(axes.variants.len());
        for id in &axes.variants {
            let entry = catalog.resolve(id)?;
            let executable = entry
                .executable
                .clone()
                .unwrap_or_else(|| ExecutableSpec::identity(id));
            let threads = effective_threads(&axes.threads, axes.max_threads, entry.max_threads);

            debug!(
                variant = %id,
                executable = %executable.command_line(),
                threads = ?threads,
                partition_flag = ?entry.partition_flag,
                "planned variant"
            );

            plans.push(VariantPlan {
                id: id.as_str(),
                executable,
                partition_flag: entry.partition_flag.as_deref(),
                threads,
            });
        }

        let sweep = Sweep {
            scenario,
            axes,
            plans,
        };
        sweep.check_templates()?;
        sweep.check_collisions()?;
        Ok(sweep)
    }
}

/// Thread counts a variant actually runs with.
///
/// The effective cap is the lower of the sweep-wide cap and the variant's own.
pub fn effective_threads(threads: &[u32], sweep_cap: u32, variant_cap: Option<u32>) -> Vec<u32> {
    let cap = variant_cap.map_or(sweep_cap, |v| v.min(sweep_cap));
    threads.iter().copied().filter(|t| *t <= cap).collect()
}

/// A validated sweep. Iterating renders invocations on demand and has no side effects.
#[derive(Debug, Clone)]
pub struct Sweep<'a> {
    scenario: &'a Scenario,
    axes: &'a SweepAxes,
    plans: Vec<VariantPlan<'a>>,
}

impl<'a> Sweep<'a> {
    pub fn scenario(&self) -> &Scenario {
        self.scenario
    }

    pub fn axes(&self) -> &SweepAxes {
        self.axes
    }

    /// Number of invocations, computed without rendering
    pub fn len(&self) -> usize {
        self.plans
            .iter()
            .map(|plan| self.axes.works.len() * plan.threads.len() * plan.partitions(self.axes).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Thread counts left for a variant after capping
    pub fn effective_threads(&self, variant: &str) -> Option<&[u32]> {
        self.plans
            .iter()
            .find(|plan| plan.id == variant)
            .map(|plan| plan.threads.as_slice())
    }

    /// Sweep points in run order: variant, then work, then thread, then partition value
    pub fn points(&self) -> impl Iterator<Item = SweepPoint<'a>> + '_ {
        self.plans.iter().flat_map(move |plan| {
            let partitions = plan.partitions(self.axes);
            self.axes.works.iter().flat_map(move |work| {
                let partitions = partitions.clone();
                plan.threads.iter().flat_map(move |thread| {
                    partitions.clone().into_iter().map(move |partition| SweepPoint {
                        variant: plan.id,
                        work: *work,
                        thread: *thread,
                        partition,
                    })
                })
            })
        })
    }

    /// Rendered invocations in run order
    pub fn iter(&self) -> impl Iterator<Item = ConfigResult<Invocation>> + '_ {
        self.points().map(move |point| self.render(&point))
    }

    /// Render everything, stopping at the first error
    pub fn invocations(&self) -> ConfigResult<Vec<Invocation>> {
        self.iter().collect()
    }

    /// Render a single point
    pub fn render(&self, point: &SweepPoint<'_>) -> ConfigResult<Invocation> {
        let plan = self
            .plans
            .iter()
            .find(|plan| plan.id == point.variant)
            .ok_or_else(|| ConfigError::UnknownVariant {
                id: point.variant.to_string(),
                suggestion: None,
            })?;

        let mut bindings = self.bindings(plan, point);

        let output_path = self
            .scenario
            .filename
            .render(&bindings)
            .map_err(|source| self.template_error("filename", source))?;

        bindings.set(Placeholder::Filename, output_path.clone());
        let command_line = self
            .scenario
            .command
            .render(&bindings)
            .map_err(|source| self.template_error("command", source))?;

        Ok(Invocation {
            command_line,
            output_path: PathBuf::from(output_path),
        })
    }

    fn bindings(&self, plan: &VariantPlan<'_>, point: &SweepPoint<'_>) -> Bindings {
        let (partition_flag, partition) = match &point.partition {
            Some(param) => (param.flag_arg(), param.value.to_string()),
            None => (String::new(), String::new()),
        };
        let perf = if self.axes.collect_perf {
            self.scenario.perf_flags.clone()
        } else {
            String::new()
        };

        Bindings::new()
            .with(Placeholder::Exe, plan.executable.command_line())
            .with(Placeholder::Variant, point.variant)
            .with(Placeholder::Thread, point.thread.to_string())
            .with(Placeholder::Work, point.work.to_string())
            .with(Placeholder::Directory, self.axes.directory.as_str())
            .with(Placeholder::PartitionFlag, partition_flag)
            .with(Placeholder::Partition, partition)
            .with(Placeholder::Perf, perf)
            .with(Placeholder::Prefill, self.axes.prefill.to_string())
    }

    /// Every placeholder is bound at every point except `{filename}` while the
    /// file name itself is rendered, so one probe per template is enough.
    fn check_templates(&self) -> ConfigResult<()> {
        let probe = Bindings::new()
            .with(Placeholder::Exe, "")
            .with(Placeholder::Variant, "")
            .with(Placeholder::Thread, "")
            .with(Placeholder::Work, "")
            .with(Placeholder::Directory, "")
            .with(Placeholder::PartitionFlag, "")
            .with(Placeholder::Partition, "")
            .with(Placeholder::Perf, "")
            .with(Placeholder::Prefill, "");

        self.scenario
            .filename
            .check(&probe)
            .map_err(|source| self.template_error("filename", source))?;

        let probe = probe.with(Placeholder::Filename, "");
        self.scenario
            .command
            .check(&probe)
            .map_err(|source| self.template_error("command", source))
    }

    /// An axis that takes more than one value for some variant must show up
    /// in the rendered part of the file name.
    fn check_collisions(&self) -> ConfigResult<()> {
        let body = self.scenario.filename.body_placeholders();

        let varying = [
            ("variant", Placeholder::Variant, self.plans.len() > 1),
            ("work", Placeholder::Work, self.axes.works.len() > 1),
            (
                "thread",
                Placeholder::Thread,
                self.plans.iter().any(|plan| plan.threads.len() > 1),
            ),
            (
                "partition",
                Placeholder::Partition,
                self.plans.iter().any(|plan| plan.partitions(self.axes).len() > 1),
            ),
        ];

        for (axis, placeholder, varies) in varying {
            if varies && !body.contains(&placeholder) {
                return Err(ConfigError::CollidingOutputPaths {
                    scenario: self.scenario.name.clone(),
                    axis,
                    placeholder,
                });
            }
        }
        Ok(())
    }

    fn template_error(&self, field: &'static str, source: TemplateError) -> ConfigError {
        ConfigError::Template {
            scenario: self.scenario.name.clone(),
            field,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VariantEntry;

    use std::collections::HashSet;

    const PRODCON: &str = "@../prodcon-{exe} -producers {thread} -consumers {thread} \
                           -c {work} {partition_flag} {partition} {perf} > {filename}";
    const PRODCON_FILE: &str =
        "@{directory}{variant}-t{thread}{partition_flag}{partition}-c{work}.txt";

    fn catalog() -> VariantCatalog {
        VariantCatalog::new()
            .with_variant("ms", VariantEntry::new())
            .with_variant("lcrq", VariantEntry::new().with_executable("lcrq -noreuse_memory"))
            .with_variant(
                "scal2random",
                VariantEntry::new()
                    .with_executable("dq-2random -nohw_random")
                    .with_partition_flag("p"),
            )
            .with_variant("fc", VariantEntry::new().with_max_threads(8))
    }

    fn prodcon() -> Scenario {
        Scenario::new("prodcon", PRODCON, PRODCON_FILE).unwrap()
    }

    #[test]
    fn test_cross_product_count_and_unique_paths() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(
            vec!["ms".into(), "lcrq".into()],
            vec![0, 2000],
            vec![1, 2, 12],
            "tmp",
        );

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let invocations = sweep.invocations().unwrap();

        assert_eq!(sweep.len(), 12);
        assert_eq!(invocations.len(), 12);
        let paths: HashSet<_> = invocations.iter().map(|i| i.output_path.clone()).collect();
        assert_eq!(paths.len(), 12);
    }

    #[test]
    fn test_ordering_is_variant_then_work_then_thread() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(
            vec!["lcrq".into(), "ms".into()],
            vec![0, 1000],
            vec![1, 2],
            "out/",
        );

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let paths: Vec<_> = sweep
            .iter()
            .map(|i| i.unwrap().output_path.to_string_lossy().to_string())
            .collect();

        assert_eq!(
            paths,
            vec![
                "out/lcrq-t1-c0.txt",
                "out/lcrq-t2-c0.txt",
                "out/lcrq-t1-c1000.txt",
                "out/lcrq-t2-c1000.txt",
                "out/ms-t1-c0.txt",
                "out/ms-t2-c0.txt",
                "out/ms-t1-c1000.txt",
                "out/ms-t2-c1000.txt",
            ]
        );
    }

    #[test]
    fn test_command_line_rendering() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(vec!["lcrq".into()], vec![250], vec![24], "tmp/");

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let invocation = sweep.iter().next().unwrap().unwrap();

        assert_eq!(
            invocation.command_line,
            "../prodcon-lcrq -noreuse_memory -producers 24 -consumers 24 -c 250    \
             > tmp/lcrq-t24-c250.txt"
        );
        assert_eq!(invocation.output_path, PathBuf::from("tmp/lcrq-t24-c250.txt"));
    }

    #[test]
    fn test_thread_axis_clipped_by_variant_cap() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(
            vec!["fc".into(), "ms".into()],
            vec![0],
            vec![1, 2, 12, 24],
            "",
        );

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        assert_eq!(sweep.effective_threads("fc"), Some(&[1, 2][..]));
        assert_eq!(sweep.effective_threads("ms"), Some(&[1, 2, 12, 24][..]));
        assert_eq!(sweep.len(), 6);
    }

    #[test]
    fn test_effective_cap_is_minimum_of_both() {
        assert_eq!(effective_threads(&[1, 2, 12, 24], 24, Some(8)), vec![1, 2]);
        assert_eq!(effective_threads(&[1, 2, 12, 24], 2, Some(8)), vec![1, 2]);
        assert_eq!(effective_threads(&[1, 2, 12, 24], 12, None), vec![1, 2, 12]);
        assert_eq!(effective_threads(&[1, 2, 12, 24], u32::MAX, None), vec![1, 2, 12, 24]);
    }

    #[test]
    fn test_partition_axis_for_supported_variant() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(vec!["scal2random".into()], vec![0], vec![2], "d/")
            .with_partitions(vec![1, 4]);

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let invocations = sweep.invocations().unwrap();

        assert_eq!(invocations.len(), 2);
        assert_eq!(
            invocations[0].output_path,
            PathBuf::from("d/scal2random-t2-p1-c0.txt")
        );
        assert_eq!(
            invocations[1].output_path,
            PathBuf::from("d/scal2random-t2-p4-c0.txt")
        );
        assert!(invocations[1]
            .command_line
            .contains("-c 0 -p 4  > d/scal2random-t2-p4-c0.txt"));
    }

    #[test]
    fn test_partition_segment_omitted_without_flag() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(vec!["ms".into()], vec![0, 1000], vec![1, 2], "d/")
            .with_partitions(vec![1, 2, 4]);

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let points: Vec<_> = sweep.points().collect();
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.partition.is_none()));

        for invocation in sweep.invocations().unwrap() {
            assert!(!invocation.command_line.contains(" -p "));
            let path = invocation.output_path.to_string_lossy().to_string();
            assert!(path.starts_with("d/ms-t"));
            assert!(!path.contains("-p"));
        }
    }

    #[test]
    fn test_perf_flags_only_when_requested() {
        let catalog = catalog();
        let scenario = prodcon().with_perf_flags("-perf_counters");

        let axes = SweepAxes::new(vec!["ms".into()], vec![0], vec![1], "");
        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let plain = sweep.invocations().unwrap();
        assert!(!plain[0].command_line.contains("-perf_counters"));

        let axes = axes.with_perf(true);
        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let perf = sweep.invocations().unwrap();
        assert!(perf[0].command_line.contains("-perf_counters"));
        assert_eq!(plain[0].output_path, perf[0].output_path);
    }

    #[test]
    fn test_unknown_variant_fails_before_any_output() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(
            vec!["ms".into(), "wf".into()],
            vec![0],
            vec![1],
            "",
        );

        let err = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant { ref id, .. } if id == "wf"));
    }

    #[test]
    fn test_command_cannot_bind_filename_inside_filename_template() {
        let catalog = catalog();
        let scenario = Scenario::new("ok", "{exe} > {filename}", "@{directory}{variant}").unwrap();
        let axes = SweepAxes::new(vec!["ms".into()], vec![0], vec![1], "");
        assert!(MatrixDriver::generate(&scenario, &catalog, &axes).is_ok());
    }

    #[test]
    fn test_prefix_hides_work_and_collides() {
        let catalog = catalog();
        let scenario = Scenario::new(
            "shortest-path",
            "{work}@../shortest-path-{exe} -threads {thread} > {filename}",
            "{work}@{directory}{variant}-t{thread}{partition_flag}{partition}.txt",
        )
        .unwrap();

        let single = SweepAxes::new(vec!["ms".into()], vec![0], vec![1, 2], "sp/");
        let sweep = MatrixDriver::generate(&scenario, &catalog, &single).unwrap();
        let invocations = sweep.invocations().unwrap();
        assert_eq!(invocations[0].command_line, "../shortest-path-ms -threads 1 > sp/ms-t1.txt");

        let many = SweepAxes::new(vec!["ms".into()], vec![0, 1000], vec![1, 2], "sp/");
        let err = MatrixDriver::generate(&scenario, &catalog, &many).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CollidingOutputPaths { axis: "work", placeholder: Placeholder::Work, .. }
        ));
    }

    #[test]
    fn test_sweep_is_restartable() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(vec!["ms".into()], vec![0, 1], vec![1, 2], "");

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        let first: Vec<_> = sweep.iter().take(2).collect::<ConfigResult<_>>().unwrap();
        let all = sweep.invocations().unwrap();
        assert_eq!(first[..], all[..2]);
        assert_eq!(sweep.invocations().unwrap(), all);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let catalog = catalog();
        let scenario = prodcon();
        let axes = SweepAxes::new(vec!["fc".into()], vec![0], vec![12, 24], "");

        let sweep = MatrixDriver::generate(&scenario, &catalog, &axes).unwrap();
        assert!(sweep.is_empty());
        assert_eq!(sweep.iter().count(), 0);
    }
}
