use multiversion::multiversion;
use rand::random;
use simdize::prelude::*;
use std::fmt::Display;
use std::hint::black_box;
use std::iter;
use std::mem::size_of;
use std::time::Instant;

// Number of simulated particles
//
// Chosen such that the working set fits in L1 cache. Should be divisible by
// `LANES`.
//
const SIZE: usize = 1024;

// Number of lanes of every vectorized particle
const LANES: usize = 8;

// Byte distance between consecutive particles in memory
const STRIDE: usize = size_of::<Particle>();

// Integration time step
const DT: f32 = 1e-3;

// Number of benchmark repetitions
const RUNS: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Particle {
    position: [f32; 3],
    velocity: [f32; 3],
    mass: f32,
}

simdize_struct! {
    #[derive(Clone, Debug)]
    struct ParticleSimd for Particle {
        position: [f32; 3],
        velocity: [f32; 3],
        mass: f32,
    }
}

impl Particle {
    fn random() -> Self {
        Self {
            position: random(),
            velocity: random::<[f32; 3]>().map(|v| v - 0.5),
            mass: 1.0 + random::<f32>(),
        }
    }

    fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.iter().map(|v| v * v).sum::<f32>()
    }
}

/// Move particles forward, bouncing off the walls of the unit box
#[inline(never)]
fn scalar_step(particles: &mut [Particle]) {
    for particle in particles {
        for dim in 0..3 {
            particle.position[dim] += particle.velocity[dim] * DT;
            let outside = particle.position[dim] < 0.0 || particle.position[dim] > 1.0;
            if outside {
                particle.velocity[dim] = -particle.velocity[dim];
            }
        }
    }
}

/// Same as `scalar_step`, on `LANES` particles at a time
macro_rules! generate_simd_step {
    ($name:ident, $dispatcher:literal) => {
        #[inline(never)]
        #[multiversion(targets = "simd", dispatcher = $dispatcher)]
        fn $name(particles: &mut [Particle]) {
            let dt = Vector::<f32, LANES>::splat(DT);
            let (low, high) = (Vector::splat(0.0), Vector::splat(1.0));
            for chunk in particles.chunks_exact_mut(LANES) {
                let location = LinearLocation::<_, LANES>::from_mut_slice(chunk, 0)
                    .expect("chunks have LANES elements");
                let mut simd = unsafe { location.load::<STRIDE>() };
                let mut bounced = simd.clone();
                for dim in 0..3 {
                    simd.position[dim] += simd.velocity[dim] * dt;
                    bounced.velocity[dim] = low - simd.velocity[dim];
                }
                for dim in 0..3 {
                    let position = simd.position[dim];
                    let outside = position.simd_lt(low) | position.simd_gt(high);
                    masked(outside, &mut simd.velocity[dim]).assign(&bounced.velocity[dim]);
                }
                unsafe { location.store::<STRIDE>(&simd) };
            }
        }
    };
}
generate_simd_step!(simd_step_static, "static");
generate_simd_step!(simd_step_dynamic, "default");

/// Kinetic energy of a random sample of particles, scalar version
#[inline(never)]
fn scalar_sample_energy(particles: &[Particle], samples: &[[u32; LANES]]) -> f32 {
    samples
        .iter()
        .flatten()
        .map(|&idx| particles[idx as usize].kinetic_energy())
        .sum()
}

/// Kinetic energy of a random sample of particles, gathered with an
/// indexed location
#[inline(never)]
#[multiversion(targets = "simd", dispatcher = "default")]
fn simd_sample_energy(particles: &[Particle], samples: &[[u32; LANES]]) -> f32 {
    let half = Vector::<f32, LANES>::splat(0.5);
    samples
        .iter()
        .map(|indices| {
            let location = IndexedLocation::from_slice(particles, indices)
                .expect("samples are drawn from the particle slice");
            let simd = unsafe { location.load::<STRIDE>() };
            let speed2 = simd
                .velocity
                .iter()
                .fold(Vector::splat(0.0), |acc, &v| acc + v * v);
            half * simd.mass * speed2
        })
        .fold(Vector::splat(0.0), |acc, energy| acc + energy)
        .horizontal_sum()
}

/// Center of mass of the particle cloud, gathering positions by accessor
#[inline(never)]
fn simd_barycenter(particles: &[Particle]) -> [f32; 3] {
    let (sum, mass) = (0..particles.len()).step_by(LANES).fold(
        ([Vector::<f32, LANES>::splat(0.0); 3], Vector::splat(0.0)),
        |(mut sum, mass), start| {
            let index = LinearIndex::new(start);
            let weighted = load_rvalue_with::<[f32; 3], LANES, _, _>(
                &index,
                |idx| &particles[idx],
                |particle: &Particle| particle.position.map(|x| x * particle.mass),
            );
            let masses = load_rvalue::<f32, LANES, _>(&index, |idx| particles[idx].mass);
            for dim in 0..3 {
                sum[dim] += weighted[dim];
            }
            (sum, mass + masses)
        },
    );
    let mass = mass.horizontal_sum();
    sum.map(|s| s.horizontal_sum() / mass)
}

fn timed<N: Display, R, F: FnMut() -> R>(name: N, runs: u32, mut f: F) -> R {
    let mut result = None;
    let start = Instant::now();
    for _ in 0..runs {
        result = Some(black_box(f()));
    }
    let elapsed = start.elapsed();
    println!("{} took:\t{:?} ({:?}/run)", name, elapsed, elapsed / runs);
    result.unwrap()
}

fn main() {
    let initial = iter::repeat_with(Particle::random)
        .take(SIZE)
        .collect::<Vec<_>>();
    let samples = iter::repeat_with(|| random::<[u32; LANES]>().map(|i| i % SIZE as u32))
        .take(SIZE / LANES)
        .collect::<Vec<_>>();

    let mut reference = initial.clone();
    timed("Scalar step", RUNS, || {
        scalar_step(black_box(&mut reference))
    });

    let assert_close = |actual: f32, expected: f32| {
        const TOLERANCE: f32 = 1e-4;
        assert!((actual - expected).abs() <= TOLERANCE * expected.abs().max(1.0));
    };
    let check_state = |particles: &[Particle]| {
        for (actual, expected) in particles.iter().zip(&reference) {
            for dim in 0..3 {
                assert_close(actual.position[dim], expected.position[dim]);
                assert_close(actual.velocity[dim], expected.velocity[dim]);
            }
        }
    };

    let mut particles = initial.clone();
    timed("SIMD step, compile-time detected", RUNS, || {
        simd_step_static(black_box(&mut particles))
    });
    check_state(&particles);
    let mut particles = initial.clone();
    timed("SIMD step, run-time detected", RUNS, || {
        simd_step_dynamic(black_box(&mut particles))
    });
    check_state(&particles);

    let e0 = timed("Scalar sampled energy", RUNS, || {
        scalar_sample_energy(black_box(&reference), black_box(&samples))
    });
    let e1 = timed("SIMD gathered energy", RUNS, || {
        simd_sample_energy(black_box(&reference), black_box(&samples))
    });
    assert_close(e1, e0);

    let barycenter = timed("SIMD barycenter", RUNS, || {
        simd_barycenter(black_box(&reference))
    });
    println!("Barycenter after {RUNS} steps: {barycenter:?}");
}
