/// Logical keys the runtime tracks. Movement actions are read as held levels;
/// the rest are consumed as one-tick press edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    ToggleInventory,
    Submit,
    Erase,
    Cancel,
}

const ACTION_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
    /// Extra presses delivered by key repeat while held; only `Erase` uses it.
    repeats: [u8; ACTION_COUNT],
}

impl ActionStates {
    /// Records a key transition. A press edge is only produced on an up->down
    /// change, so holding a key never retriggers one-shot actions.
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn set_level(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn mark_pressed(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
    }

    pub(crate) fn record_repeat(&mut self, action: InputAction) {
        let index = action.index();
        self.repeats[index] = self.repeats[index].saturating_add(1);
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn press_count(&self, action: InputAction) -> u32 {
        let index = action.index();
        u32::from(self.pressed[index]) + u32::from(self.repeats[index])
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
        self.repeats = [0; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::ToggleInventory => 5,
            InputAction::Submit => 6,
            InputAction::Erase => 7,
            InputAction::Cancel => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_only_on_transition_to_down() {
        let mut states = ActionStates::default();
        states.set(InputAction::Interact, true);
        assert!(states.was_pressed(InputAction::Interact));

        states.clear_edges();
        states.set(InputAction::Interact, true);
        assert!(states.is_down(InputAction::Interact));
        assert!(!states.was_pressed(InputAction::Interact));
    }

    #[test]
    fn repeats_add_to_press_count_until_cleared() {
        let mut states = ActionStates::default();
        states.set(InputAction::Erase, true);
        states.record_repeat(InputAction::Erase);
        states.record_repeat(InputAction::Erase);
        assert_eq!(states.press_count(InputAction::Erase), 3);

        states.clear_edges();
        assert_eq!(states.press_count(InputAction::Erase), 0);
        assert!(states.is_down(InputAction::Erase));
    }
}
