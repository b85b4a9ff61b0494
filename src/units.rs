#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub struct Width(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub struct Height(pub usize);

/// Position of a non-blocker module in build order. The first module built is index 0.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Ord, PartialOrd)]
pub struct ModuleIndex(pub usize);

/// Identifier of any built module (blockers included), an index into the maze's module list.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Ord, PartialOrd)]
pub struct ModuleId(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct StepsCount(pub usize);

impl ModuleIndex {
    #[inline]
    pub fn is_first(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_multiple_of(&self, n: usize) -> bool {
        n != 0 && self.0 % n == 0
    }
}
