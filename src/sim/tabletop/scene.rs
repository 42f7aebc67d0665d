//! Task definitions of the tabletop simulator
//!
//! Each exported task is a static entry pairing its class handle with a
//! factory that lays out the scene for a variation index.

use crate::sim::TaskClass;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Named colours indexed by variation
pub(crate) const COLORS: [(&str, [u8; 3]); 20] = [
    ("red", [230, 25, 25]),
    ("maroon", [128, 0, 0]),
    ("lime", [50, 230, 50]),
    ("green", [0, 128, 0]),
    ("blue", [30, 60, 230]),
    ("navy", [0, 0, 128]),
    ("yellow", [240, 230, 40]),
    ("cyan", [40, 230, 230]),
    ("magenta", [230, 40, 230]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("orange", [255, 140, 0]),
    ("olive", [128, 128, 0]),
    ("purple", [128, 0, 128]),
    ("teal", [0, 128, 128]),
    ("azure", [0, 128, 255]),
    ("violet", [140, 0, 255]),
    ("rose", [255, 0, 128]),
    ("black", [20, 20, 20]),
    ("white", [245, 245, 245]),
];

const NUMBERED_BLOCK_COLOR: [u8; 3] = [210, 200, 180];
const BLOCK_HALF_EXTENT: f64 = 0.025;
const CUP_HALF_EXTENT: f64 = 0.035;
const TARGET_HALF_EXTENT: f64 = 0.02;
const MIN_SPACING: f64 = 0.12;
const PLACEMENT_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectShape {
    Block,
    Cup,
    /// Flat marker: reach targets and buttons
    Marker,
}

impl ObjectShape {
    pub(crate) fn graspable(self) -> bool {
        matches!(self, Self::Block | Self::Cup)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SceneObject {
    pub(crate) shape: ObjectShape,
    /// Centre of the object in metres, table surface at z = 0
    pub(crate) position: [f64; 3],
    pub(crate) half_extent: f64,
    pub(crate) color: [u8; 3],
    pub(crate) label: Option<u32>,
}

/// How a task decides it has been solved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SuccessCondition {
    /// Target grasped and raised above the lift height
    Lifted,
    /// Gripper within reach distance of the target
    Reached,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scene {
    pub(crate) objects: Vec<SceneObject>,
    pub(crate) target: usize,
    pub(crate) success: SuccessCondition,
    pub(crate) descriptions: Vec<String>,
}

impl Scene {
    pub(crate) fn target(&self) -> Option<&SceneObject> {
        self.objects.get(self.target)
    }

    pub(crate) fn target_mut(&mut self) -> Option<&mut SceneObject> {
        self.objects.get_mut(self.target)
    }
}

pub(crate) type SceneFactory = fn(u32, &mut ChaCha8Rng) -> Scene;

pub(crate) struct TaskEntry {
    pub(crate) class: TaskClass,
    pub(crate) build: SceneFactory,
}

/// Every task the tabletop simulator exports
pub(crate) static TASKS: [TaskEntry; 5] = [
    TaskEntry {
        class: TaskClass {
            name: "PickAndLift",
            variation_count: 20,
        },
        build: pick_and_lift,
    },
    TaskEntry {
        class: TaskClass {
            name: "PickUpCup",
            variation_count: 20,
        },
        build: pick_up_cup,
    },
    TaskEntry {
        class: TaskClass {
            name: "LiftNumberedBlock",
            variation_count: 3,
        },
        build: lift_numbered_block,
    },
    TaskEntry {
        class: TaskClass {
            name: "ReachTarget",
            variation_count: 20,
        },
        build: reach_target,
    },
    TaskEntry {
        class: TaskClass {
            name: "PushButton",
            variation_count: 20,
        },
        build: push_button,
    },
];

pub(crate) fn find_task(name: &str) -> Option<&'static TaskEntry> {
    TASKS.iter().find(|entry| entry.class.name == name)
}

/// Stable per-(task, variation) seed: FNV-1a over the name, mixed with the index
pub(crate) fn scene_seed(task: &str, variation: u32) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in task.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash ^ u64::from(variation).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

fn color(index: usize) -> (&'static str, [u8; 3]) {
    COLORS[index % COLORS.len()]
}

/// Colour indices other than `exclude`, `count` of them
fn distractor_colors(exclude: usize, count: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let candidate = rng.gen_range(0..COLORS.len());
        if candidate != exclude && !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    picked
}

fn place(rng: &mut ChaCha8Rng, placed: &[SceneObject], half_extent: f64) -> [f64; 3] {
    let mut position = [0.5, 0.0, half_extent];
    for _ in 0..PLACEMENT_ATTEMPTS {
        position = [rng.gen_range(0.35..0.7), rng.gen_range(-0.3..0.3), half_extent];
        let clear = placed.iter().all(|other| {
            let dx = other.position[0] - position[0];
            let dy = other.position[1] - position[1];
            dx.hypot(dy) >= MIN_SPACING
        });
        if clear {
            break;
        }
    }
    position
}

fn object(
    rng: &mut ChaCha8Rng,
    placed: &[SceneObject],
    shape: ObjectShape,
    half_extent: f64,
    color: [u8; 3],
    label: Option<u32>,
) -> SceneObject {
    SceneObject {
        shape,
        position: place(rng, placed, half_extent),
        half_extent,
        color,
        label,
    }
}

/// Target object first, then distractors of the same shape
fn colored_scene(
    variation: u32,
    rng: &mut ChaCha8Rng,
    shape: ObjectShape,
    half_extent: f64,
    distractors: usize,
    success: SuccessCondition,
) -> (&'static str, Scene) {
    let target_index = variation as usize;
    let (name, rgb) = color(target_index);
    let mut objects = Vec::with_capacity(distractors + 1);
    let target = object(rng, &objects, shape, half_extent, rgb, None);
    objects.push(target);
    for index in distractor_colors(target_index % COLORS.len(), distractors, rng) {
        let next = object(rng, &objects, shape, half_extent, color(index).1, None);
        objects.push(next);
    }
    (
        name,
        Scene {
            objects,
            target: 0,
            success,
            descriptions: Vec::new(),
        },
    )
}

fn pick_and_lift(variation: u32, rng: &mut ChaCha8Rng) -> Scene {
    let (name, mut scene) = colored_scene(
        variation,
        rng,
        ObjectShape::Block,
        BLOCK_HALF_EXTENT,
        2,
        SuccessCondition::Lifted,
    );
    scene.descriptions = vec![
        format!("pick up the {name} block and lift it up to the target"),
        format!("grasp the {name} block to the target"),
        format!("lift the {name} block up to the target"),
    ];
    scene
}

fn pick_up_cup(variation: u32, rng: &mut ChaCha8Rng) -> Scene {
    let (name, mut scene) = colored_scene(
        variation,
        rng,
        ObjectShape::Cup,
        CUP_HALF_EXTENT,
        1,
        SuccessCondition::Lifted,
    );
    scene.descriptions = vec![
        format!("pick up the {name} cup"),
        format!("grasp the {name} cup and lift it"),
        format!("lift the {name} cup"),
    ];
    scene
}

fn lift_numbered_block(variation: u32, rng: &mut ChaCha8Rng) -> Scene {
    let mut objects: Vec<SceneObject> = Vec::with_capacity(3);
    for label in 1..=3 {
        let next = object(
            rng,
            &objects,
            ObjectShape::Block,
            BLOCK_HALF_EXTENT,
            NUMBERED_BLOCK_COLOR,
            Some(label),
        );
        objects.push(next);
    }
    let number = variation % 3 + 1;
    Scene {
        objects,
        target: (number - 1) as usize,
        success: SuccessCondition::Lifted,
        descriptions: vec![
            format!("pick up the block with the number {number}"),
            format!("grasp the {number} numbered block and lift it up"),
            format!("lift the block labelled {number}"),
        ],
    }
}

fn reach_target(variation: u32, rng: &mut ChaCha8Rng) -> Scene {
    let (name, mut scene) = colored_scene(
        variation,
        rng,
        ObjectShape::Marker,
        TARGET_HALF_EXTENT,
        2,
        SuccessCondition::Reached,
    );
    if let Some(target) = scene.target_mut() {
        target.position[2] = rng.gen_range(0.1..0.4);
    }
    scene.descriptions = vec![
        format!("reach the {name} target"),
        format!("touch the {name} ball with the panda gripper"),
    ];
    scene
}

fn push_button(variation: u32, rng: &mut ChaCha8Rng) -> Scene {
    let (name, mut scene) = colored_scene(
        variation,
        rng,
        ObjectShape::Marker,
        TARGET_HALF_EXTENT,
        0,
        SuccessCondition::Reached,
    );
    scene.descriptions = vec![
        format!("push the {name} button"),
        format!("press the {name} button"),
    ];
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn build(name: &str, variation: u32) -> Scene {
        let entry = find_task(name).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(scene_seed(name, variation));
        (entry.build)(variation, &mut rng)
    }

    #[test]
    fn test_scene_is_reproducible() {
        assert_eq!(build("PickAndLift", 4), build("PickAndLift", 4));
        assert_ne!(build("PickAndLift", 4), build("PickAndLift", 5));
    }

    #[test]
    fn test_pick_and_lift_target_colour_follows_variation() {
        let scene = build("PickAndLift", 0);
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.target().unwrap().color, COLORS[0].1);
        assert!(scene.descriptions[0].contains("red block"));
        for distractor in &scene.objects[1..] {
            assert_ne!(distractor.color, COLORS[0].1);
        }
    }

    #[test]
    fn test_numbered_block_target() {
        let scene = build("LiftNumberedBlock", 2);
        assert_eq!(scene.target().unwrap().label, Some(3));
        assert!(scene.descriptions[0].contains("number 3"));
    }

    #[test]
    fn test_objects_rest_on_table_in_workspace() {
        for entry in &TASKS {
            let scene = build(entry.class.name, 1);
            for object in &scene.objects {
                assert!((0.35..0.7).contains(&object.position[0]));
                assert!((-0.3..0.3).contains(&object.position[1]));
                assert!(object.position[2] >= object.half_extent);
            }
        }
    }

    #[test]
    fn test_scene_seed_is_stable() {
        assert_eq!(scene_seed("PickAndLift", 0), scene_seed("PickAndLift", 0));
        assert_ne!(scene_seed("PickAndLift", 0), scene_seed("PickUpCup", 0));
        assert_ne!(scene_seed("PickAndLift", 0), scene_seed("PickAndLift", 1));
    }
}
