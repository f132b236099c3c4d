use crate::traits::Cost;

/// One node on a solution path.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step<S, A> {
    pub state: S,
    /// The action that produced `state`; `None` for the start.
    pub action: Option<A>,
    /// Path cost from the start.
    pub g: Cost,
}

/// A path from the start state, start first.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path<S, A> {
    steps: Vec<Step<S, A>>,
}

impl<S, A> Path<S, A> {
    /// Wrap a non-empty, start-first step list.
    pub(crate) fn from_steps(steps: Vec<Step<S, A>>) -> Self {
        debug_assert!(!steps.is_empty());
        Self { steps }
    }

    pub fn steps(&self) -> &[Step<S, A>] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step<S, A>> {
        self.steps
    }

    /// Number of actions (one less than the number of states).
    pub fn len(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every state on the path, start included.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.steps.iter().map(|s| &s.state)
    }

    /// The actions, in order.
    pub fn actions(&self) -> impl Iterator<Item = &A> {
        self.steps.iter().filter_map(|s| s.action.as_ref())
    }

    /// The state reached at the end of the path.
    pub fn final_state(&self) -> Option<&S> {
        self.steps.last().map(|s| &s.state)
    }

    /// Total path cost.
    pub fn cost(&self) -> Cost {
        self.steps.last().map_or(0, |s| s.g)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn path_json() {
        let p = Path::from_steps(vec![
            Step { state: 0u8, action: None, g: 0 },
            Step { state: 1u8, action: Some(1i8), g: 1 },
        ]);
        let json = serde_json::to_string(&p).unwrap();
        let back: Path<u8, i8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
