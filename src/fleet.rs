//! The robot fleet and the fixed set of physical actions it understands.

mod publish;

pub use publish::{HttpPublisher, Publisher};
#[cfg(test)]
pub use publish::MockPublisher;

use crate::types::{Tool, ToolSpec};

/// Target name that expands to every robot in the fleet.
pub const ALL_ROBOTS: &str = "all";

/// One physical action. `command` is the controller code pair the robot
/// client executes and `duration_secs` how long the motion takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub duration_secs: f32,
    pub command: (u8, u8),
}

const fn action(
    name: &'static str,
    label: &'static str,
    description: &'static str,
    duration_secs: f32,
    command: (u8, u8),
) -> Action {
    Action {
        name,
        label,
        description,
        duration_secs,
        command,
    }
}

pub const ACTIONS: &[Action] = &[
    action(
        "stand",
        "Stand",
        "Command the robot to stand up and maintain a standing position.",
        1.0,
        (0, 1),
    ),
    action(
        "go_forward",
        "Go forward",
        "Command the robot to move forward in the direction it is currently facing.",
        3.5,
        (1, 4),
    ),
    action(
        "back_fast",
        "Back fast",
        "Command the robot to move backward quickly.",
        4.5,
        (2, 4),
    ),
    action(
        "left_move_fast",
        "Left move fast",
        "Command the robot to move left quickly.",
        3.0,
        (3, 4),
    ),
    action(
        "right_move_fast",
        "Right move fast",
        "Command the robot to move right quickly.",
        3.0,
        (4, 4),
    ),
    action(
        "sit_ups",
        "Sit ups",
        "Command the robot to perform sit-ups.",
        12.0,
        (6, 1),
    ),
    action(
        "turn_left",
        "Turn left",
        "Command the robot to turn left.",
        4.0,
        (7, 4),
    ),
    action(
        "turn_right",
        "Turn right",
        "Command the robot to turn right.",
        4.0,
        (8, 4),
    ),
    action(
        "wave",
        "Wave",
        "Command the robot to wave its hand.",
        3.5,
        (9, 1),
    ),
    action("bow", "Bow", "Command the robot to bow.", 4.0, (10, 1)),
    action(
        "squat",
        "Squat",
        "Command the robot to squat down.",
        1.0,
        (11, 1),
    ),
    action(
        "chest",
        "Chest",
        "Command the robot to perform chest exercises.",
        9.0,
        (12, 1),
    ),
    action(
        "left_shot_fast",
        "Left shot fast",
        "Command the robot to perform a fast left punch.",
        4.0,
        (13, 1),
    ),
    action(
        "right_shot_fast",
        "Right shot fast",
        "Command the robot to perform a fast right punch.",
        4.0,
        (14, 1),
    ),
    action(
        "wing_chun",
        "Wing chun",
        "Command the robot to perform Wing Chun moves.",
        2.0,
        (15, 1),
    ),
    action(
        "left_uppercut",
        "Left uppercut",
        "Command the robot to perform a left uppercut.",
        2.0,
        (16, 1),
    ),
    action(
        "right_uppercut",
        "Right uppercut",
        "Command the robot to perform a right uppercut.",
        2.0,
        (17, 1),
    ),
    action(
        "left_kick",
        "Left kick",
        "Command the robot to perform a left kick.",
        2.0,
        (18, 1),
    ),
    action(
        "right_kick",
        "Right kick",
        "Command the robot to perform a right kick.",
        2.0,
        (19, 1),
    ),
    action(
        "stand_up_front",
        "Stand up front",
        "Command the robot to stand up from the front.",
        5.0,
        (20, 1),
    ),
    action(
        "stand_up_back",
        "Stand up back",
        "Command the robot to stand up from the back.",
        5.0,
        (21, 1),
    ),
    action(
        "twist",
        "Twist",
        "Command the robot to twist its body.",
        4.0,
        (22, 1),
    ),
    action(
        "stand_slow",
        "Stand slow",
        "Command the robot to stand up slowly.",
        1.0,
        (23, 1),
    ),
    action(
        "stepping",
        "Stepping",
        "Command the robot to perform stepping motions.",
        3.0,
        (24, 2),
    ),
    action(
        "stop",
        "Stop",
        "Command the robot to stop all actions.",
        1.0,
        (24, 2),
    ),
];

/// Case-insensitive lookup of a built-in action.
pub fn find_action(name: &str) -> Option<&'static Action> {
    let name = name.trim();
    ACTIONS.iter().find(|action| action.name.eq_ignore_ascii_case(name))
}

pub fn action_tools() -> Vec<Tool> {
    ACTIONS
        .iter()
        .map(|action| Tool::from(ToolSpec::new(action.name, action.description)))
        .collect()
}

/// `- name: description` lines for the system prompt.
pub fn actions_prompt() -> String {
    ACTIONS
        .iter()
        .map(|action| format!("- {}: {}", action.name, action.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Robot identifiers addressed when a session targets "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    ids: Vec<String>,
}

impl Fleet {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// `robot_1` through `robot_{size}`.
    pub fn numbered(size: usize) -> Self {
        Self::new((1..=size).map(|i| format!("robot_{}", i)).collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Resolves session targets to concrete robot ids. "all" anywhere in the
    /// list means the whole fleet; duplicates are dropped.
    pub fn expand(&self, targets: &[String]) -> Vec<String> {
        if targets.iter().any(|t| t.eq_ignore_ascii_case(ALL_ROBOTS)) {
            return self.ids.clone();
        }
        let mut expanded: Vec<String> = Vec::with_capacity(targets.len());
        for target in targets {
            if !expanded.contains(target) {
                expanded.push(target.clone());
            }
        }
        expanded
    }

    pub fn topic_for(robot_id: &str) -> String {
        format!("{}/topic", robot_id)
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::numbered(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let wave = find_action("WAVE").unwrap();
        assert_eq!(wave.name, "wave");
        assert_eq!(wave.command, (9, 1));
        assert!(find_action("moonwalk").is_none());
    }

    #[test]
    fn every_action_is_advertised() {
        let tools = action_tools();
        assert_eq!(tools.len(), ACTIONS.len());
        assert!(tools.iter().any(|t| t.name() == "stop"));
        assert!(actions_prompt().contains("- stand: Command the robot to stand up"));
    }

    #[test]
    fn all_expands_to_the_whole_fleet() {
        let fleet = Fleet::numbered(3);
        assert_eq!(fleet.expand(&["all".to_string()]), ["robot_1", "robot_2", "robot_3"]);
        assert_eq!(
            fleet.expand(&["robot_2".to_string(), "robot_2".to_string()]),
            ["robot_2"]
        );
        assert!(fleet.expand(&[]).is_empty());
        assert_eq!(Fleet::topic_for("robot_2"), "robot_2/topic");
    }
}
