use std::f32::consts::TAU;

use glam::{Vec3, vec3};

use super::arena::SimArena;

const REPULSION_STRENGTH: f32 = 6_000.0;
const SOFTENING: f32 = 380.0;
const SPRING_DAMPING: f32 = 0.22;
const NAMESPACE_PULL: f32 = 0.012;
const CENTER_PULL: f32 = 0.02;
const VELOCITY_DAMPING: f32 = 0.86;
const FORCE_STEP: f32 = 0.055;
const MAX_FORCE: f32 = 140.0;
/// Hard cap on per-step travel; continuity across updates is bounded by this.
pub(crate) const MAX_SPEED: f32 = 18.0;
const MIN_SLEEP_SPEED: f32 = 0.02;
const MIN_SLEEP_FORCE: f32 = 0.08;

/// One semi-implicit Euler step over the whole arena. Returns the total
/// kinetic energy after integration.
pub(super) fn step_forces(arena: &mut SimArena) -> f32 {
    let node_count = arena.bodies.len();
    if node_count == 0 {
        return 0.0;
    }

    arena.forces.resize(node_count, Vec3::ZERO);
    arena.forces.fill(Vec3::ZERO);

    let bodies = &mut arena.bodies;
    let forces = &mut arena.forces;

    // Pairwise inverse-square repulsion with a softening clamp. O(n^2) is
    // fine at the few hundred nodes a filtered view shows.
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = bodies[i].position - bodies[j].position;
            let distance_sq = delta.length_squared();
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                let angle =
                    ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * TAU;
                vec3(angle.cos(), 0.0, angle.sin())
            };

            let repulsion = REPULSION_STRENGTH / (distance_sq + SOFTENING);
            forces[i] += direction * repulsion;
            forces[j] -= direction * repulsion;
        }
    }

    for &(from, to, kind) in &arena.links {
        let delta = bodies[from].position - bodies[to].position;
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let spring = (distance - kind.rest_length()) * kind.stiffness();
        let relative_velocity = bodies[from].velocity - bodies[to].velocity;
        let damping_force = relative_velocity.dot(direction) * SPRING_DAMPING;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    if arena.config.namespace_projection && !arena.groups.is_empty() {
        let centroids = &mut arena.group_centroids;
        centroids.clear();
        centroids.resize(arena.groups.len(), (Vec3::ZERO, 0));
        for (index, group) in arena.group_of.iter().enumerate() {
            if let Some(group) = group {
                centroids[*group].0 += bodies[index].position;
                centroids[*group].1 += 1;
            }
        }

        for (index, group) in arena.group_of.iter().enumerate() {
            let Some(group) = group else {
                continue;
            };
            let (sum, count) = centroids[*group];
            if count < 2 {
                continue;
            }
            let centroid = sum / count as f32;
            forces[index] += (centroid - bodies[index].position) * NAMESPACE_PULL;
        }
    }

    let mut centroid = Vec3::ZERO;
    for body in bodies.iter() {
        centroid += body.position;
    }
    centroid /= node_count as f32;
    for force in forces.iter_mut() {
        *force -= centroid * CENTER_PULL;
    }

    let max_force_sq = MAX_FORCE * MAX_FORCE;
    let max_speed_sq = MAX_SPEED * MAX_SPEED;
    let min_sleep_speed_sq = MIN_SLEEP_SPEED * MIN_SLEEP_SPEED;
    let min_sleep_force_sq = MIN_SLEEP_FORCE * MIN_SLEEP_FORCE;
    let mut kinetic_energy = 0.0;
    for (index, force_value) in forces.iter().enumerate() {
        let mut force = *force_value;
        let force_sq = force.length_squared();
        if force_sq > max_force_sq {
            force *= MAX_FORCE / force_sq.sqrt();
        }

        let mut velocity = (bodies[index].velocity + force * FORCE_STEP) * VELOCITY_DAMPING;
        let mut speed_sq = velocity.length_squared();
        if speed_sq > max_speed_sq {
            velocity *= MAX_SPEED / speed_sq.sqrt();
            speed_sq = max_speed_sq;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec3::ZERO;
            speed_sq = 0.0;
        }

        bodies[index].velocity = velocity;
        bodies[index].position += velocity;
        kinetic_energy += 0.5 * speed_sq;
    }

    kinetic_energy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineUpdate, SeededNode};
    use crate::types::{LinkKind, SimConfig, SimLink, SimNode};

    fn seeded(id: &str, namespace: Option<&str>, hint: Vec3) -> SeededNode {
        SeededNode {
            node: SimNode {
                id: id.to_owned(),
                kind: "pod".to_owned(),
                namespace: namespace.map(str::to_owned),
            },
            hint: Some(hint),
        }
    }

    #[test]
    fn linked_pair_converges_near_rest_length() {
        let mut arena = SimArena::default();
        arena.apply_update(EngineUpdate {
            nodes: vec![
                seeded("a", None, vec3(-30.0, 0.0, 4.0)),
                seeded("b", None, vec3(25.0, 0.0, -6.0)),
            ],
            links: vec![SimLink {
                source: "a".to_owned(),
                target: "b".to_owned(),
                kind: LinkKind::Ownership,
            }],
            config: SimConfig::default(),
        });

        for _ in 0..900 {
            step_forces(&mut arena);
        }

        let distance = arena.bodies[0].position.distance(arena.bodies[1].position);
        let rest = LinkKind::Ownership.rest_length();
        assert!(
            (distance - rest).abs() < rest * 0.3,
            "settled distance {distance} too far from rest length {rest}"
        );

        // and it is stable, not oscillating
        let before = arena.bodies[0].position.distance(arena.bodies[1].position);
        for _ in 0..60 {
            step_forces(&mut arena);
        }
        let after = arena.bodies[0].position.distance(arena.bodies[1].position);
        assert!((before - after).abs() < 1.0);
    }

    #[test]
    fn convergence_is_repeatable_for_identical_seeds() {
        let run = || {
            let mut arena = SimArena::default();
            arena.apply_update(EngineUpdate {
                nodes: vec![
                    seeded("a", None, vec3(-30.0, 0.0, 4.0)),
                    seeded("b", None, vec3(25.0, 0.0, -6.0)),
                ],
                links: vec![SimLink {
                    source: "a".to_owned(),
                    target: "b".to_owned(),
                    kind: LinkKind::Ownership,
                }],
                config: SimConfig::default(),
            });
            for _ in 0..300 {
                step_forces(&mut arena);
            }
            (arena.bodies[0].position, arena.bodies[1].position)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn continuity_across_updates_is_bounded_by_one_step() {
        let mut arena = SimArena::default();
        arena.apply_update(EngineUpdate {
            nodes: vec![
                seeded("a", None, vec3(-40.0, 0.0, 0.0)),
                seeded("b", None, vec3(40.0, 0.0, 0.0)),
            ],
            links: Vec::new(),
            config: SimConfig::default(),
        });
        for _ in 0..50 {
            step_forces(&mut arena);
        }

        let before: Vec<Vec3> = arena.bodies.iter().map(|body| body.position).collect();
        let ids_before = arena.ids.clone();

        arena.apply_update(EngineUpdate {
            nodes: vec![
                seeded("a", None, vec3(-40.0, 0.0, 0.0)),
                seeded("b", None, vec3(40.0, 0.0, 0.0)),
                seeded("c", None, vec3(0.0, 0.0, 90.0)),
            ],
            links: Vec::new(),
            config: SimConfig::default(),
        });
        step_forces(&mut arena);

        for (id, position) in ids_before.iter().zip(before.iter()) {
            let index = arena.ids.iter().position(|candidate| candidate == id).unwrap();
            assert!(
                arena.bodies[index].position.distance(*position) <= MAX_SPEED,
                "node {id} teleported across an update"
            );
        }
    }

    #[test]
    fn all_coordinates_stay_finite() {
        let mut arena = SimArena::default();
        // two nodes at the exact same point exercise the degenerate-direction
        // fallback
        arena.apply_update(EngineUpdate {
            nodes: vec![
                seeded("a", None, Vec3::ZERO),
                seeded("b", None, Vec3::ZERO),
            ],
            links: Vec::new(),
            config: SimConfig::default(),
        });

        for _ in 0..200 {
            step_forces(&mut arena);
        }
        for body in &arena.bodies {
            assert!(body.position.is_finite());
            assert!(body.velocity.is_finite());
        }
    }
}
