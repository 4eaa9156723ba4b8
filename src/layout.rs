use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

/// One-shot force-directed layout. The presentation layer treats this as an
/// opaque solver: it runs once at load for initial placement and inside the
/// offload worker for large snapshots.
pub fn force_layout(node_ids: &[String], edges: &[(usize, usize)], iterations: usize) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let ring_radius = (n as f32).sqrt() * 260.0;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            vec2(angle.cos(), angle.sin()) * ring_radius + vec2(jx * 120.0, jy * 120.0)
        })
        .collect::<Vec<_>>();

    if n == 1 {
        return positions;
    }

    let area = (ring_radius * 2.2).powi(2);
    let k = (area / n as f32).sqrt().max(30.0);
    let mut temperature = (k * 4.5).max(120.0);

    for _ in 0..iterations {
        let mut displacement = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let push = (k * k / distance).min(k * 12.0);
                let direction = delta / distance;
                displacement[i] += direction * push;
                displacement[j] -= direction * push;
            }
        }

        for &(source, target) in edges {
            if source >= n || target >= n || source == target {
                continue;
            }
            let delta = positions[source] - positions[target];
            let distance = delta.length().max(0.5);
            let pull = (distance - k) * 0.16;
            let direction = delta / distance;
            displacement[source] -= direction * pull;
            displacement[target] += direction * pull;
        }

        for i in 0..n {
            displacement[i] -= positions[i] * 0.0015;
        }

        for i in 0..n {
            let step = displacement[i];
            let length = step.length();
            if length > 0.0 {
                positions[i] += step / length * length.min(temperature);
            }
        }

        temperature *= 0.96;
        if temperature < 0.5 {
            break;
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_deterministic_for_the_same_input() {
        let ids = ["a", "b", "c", "d"]
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        let edges = vec![(0, 1), (1, 2), (2, 3)];
        assert_eq!(
            force_layout(&ids, &edges, 30),
            force_layout(&ids, &edges, 30)
        );
    }

    #[test]
    fn connected_nodes_end_up_closer_than_disconnected_ones() {
        let ids = (0..6).map(|i| format!("n{i}")).collect::<Vec<_>>();
        let edges = vec![(0, 1), (1, 2), (3, 4)];
        let positions = force_layout(&ids, &edges, 120);
        let connected = (positions[0] - positions[1]).length();
        let disconnected = (positions[0] - positions[5]).length();
        assert!(connected < disconnected);
    }
}
