//! Goal-biased RRT over axis-aligned obstacles
//!
//! Plans end-effector positions only. The target's own boxes and the
//! manipulator's links are not obstacles. Found paths are shortcut greedily
//! and then resampled so no two waypoints are further apart than
//! `max_spacing`. Every waypoint keeps the start orientation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{CollisionGeometry, Path, Pose, Vec3};
use crate::motion::planner::{MotionPlanner, PlanOutcome, PlanRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Sampling volume corners (world frame)
    pub workspace_min: Vec3,
    pub workspace_max: Vec3,
    /// Tree extension length (metres)
    pub step: f64,
    /// Probability of sampling the goal directly
    pub goal_bias: f64,
    pub max_iterations: usize,
    /// Clearance added around every obstacle
    pub margin: f64,
    /// Largest distance between consecutive output waypoints
    pub max_spacing: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            workspace_min: Vec3::new(-1.0, -1.0, 0.0),
            workspace_max: Vec3::new(1.0, 1.0, 1.5),
            step: 0.05,
            goal_bias: 0.15,
            max_iterations: 5000,
            margin: 0.02,
            max_spacing: 0.05,
        }
    }
}

pub struct SimPlanner {
    config: PlannerConfig,
    rng: ChaCha8Rng,
}

impl SimPlanner {
    pub fn new(config: PlannerConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self, goal: Vec3) -> Vec3 {
        if self.rng.gen::<f64>() < self.config.goal_bias {
            return goal;
        }
        let (lo, hi) = (self.config.workspace_min, self.config.workspace_max);
        Vec3::new(
            self.rng.gen_range(lo.x..=hi.x),
            self.rng.gen_range(lo.y..=hi.y),
            self.rng.gen_range(lo.z..=hi.z),
        )
    }

    fn search(
        &mut self,
        start: Vec3,
        goal: Vec3,
        obstacles: &[CollisionGeometry],
    ) -> Option<Vec<Vec3>> {
        if segment_free(start, goal, obstacles) {
            return Some(vec![start, goal]);
        }

        // (position, parent index)
        let mut tree: Vec<(Vec3, usize)> = vec![(start, 0)];

        for _ in 0..self.config.max_iterations {
            let sample = self.sample(goal);
            let nearest = tree
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    let da = a.1 .0.distance_squared(sample);
                    let db = b.1 .0.distance_squared(sample);
                    da.total_cmp(&db)
                })
                .map(|(i, _)| i)
                .unwrap_or(0);

            let from = tree[nearest].0;
            let candidate = from + (sample - from).clamp_length_max(self.config.step);
            if !segment_free(from, candidate, obstacles) {
                continue;
            }
            tree.push((candidate, nearest));

            if candidate.distance(goal) <= self.config.step
                && segment_free(candidate, goal, obstacles)
            {
                tree.push((goal, tree.len() - 1));
                return Some(reconstruct(&tree));
            }
        }
        None
    }
}

fn segment_free(from: Vec3, to: Vec3, obstacles: &[CollisionGeometry]) -> bool {
    obstacles.iter().all(|o| !o.intersects_segment(from, to))
}

/// Walk parent links back from the last node
fn reconstruct(tree: &[(Vec3, usize)]) -> Vec<Vec3> {
    let mut idx = tree.len() - 1;
    let mut points = vec![tree[idx].0];
    while idx != 0 {
        idx = tree[idx].1;
        points.push(tree[idx].0);
    }
    points.reverse();
    points
}

/// Skip every intermediate point that a straight segment can bypass
fn shortcut(points: &[Vec3], obstacles: &[CollisionGeometry]) -> Vec<Vec3> {
    let mut out = vec![points[0]];
    let mut i = 0;
    while i < points.len() - 1 {
        let mut j = points.len() - 1;
        while j > i + 1 && !segment_free(points[i], points[j], obstacles) {
            j -= 1;
        }
        out.push(points[j]);
        i = j;
    }
    out
}

fn densify(points: &[Vec3], max_spacing: f64) -> Vec<Vec3> {
    let mut out = vec![points[0]];
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let pieces = (a.distance(b) / max_spacing).ceil().max(1.0) as usize;
        for k in 1..=pieces {
            out.push(a.lerp(b, k as f64 / pieces as f64));
        }
    }
    out
}

impl MotionPlanner for SimPlanner {
    fn plan(&mut self, request: &PlanRequest<'_>) -> PlanOutcome {
        let obstacles: Vec<CollisionGeometry> = request
            .obstacles
            .iter()
            .filter(|g| !g.name.contains(request.target) && !g.name.contains(request.manipulator))
            .map(|g| g.inflated(self.config.margin))
            .collect();

        let start = request.start.position;
        if let Some(blocker) = obstacles.iter().find(|o| o.contains(start)) {
            return PlanOutcome::NotFound(format!("start lies inside [{}]", blocker.name));
        }
        if let Some(blocker) = obstacles.iter().find(|o| o.contains(request.goal)) {
            return PlanOutcome::NotFound(format!("goal lies inside [{}]", blocker.name));
        }

        let Some(raw) = self.search(start, request.goal, &obstacles) else {
            return PlanOutcome::NotFound(format!(
                "no path after {} iterations",
                self.config.max_iterations
            ));
        };

        let points = densify(&shortcut(&raw, &obstacles), self.config.max_spacing);
        tracing::debug!(
            raw = raw.len(),
            waypoints = points.len(),
            obstacles = obstacles.len(),
            "path found"
        );

        let orientation = request.start.orientation;
        PlanOutcome::Found(Path::new(
            points.into_iter().map(|p| Pose::new(p, orientation)).collect(),
        ))
    }
}
