use crate::parser::Arg;

/// Every argument of a completed parse, in the order it was matched.
///
/// Lookups scan linearly; declaration lists and command lines are short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches<'a, Id> {
    args: Vec<Arg<'a, Id>>,
}

impl<'a, Id> Default for Matches<'a, Id> {
    fn default() -> Self {
        Self { args: Vec::new() }
    }
}

impl<'a, Id> Matches<'a, Id> {
    pub(crate) fn push(&mut self, arg: Arg<'a, Id>) {
        self.args.push(arg);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg<'a, Id>> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_vec(self) -> Vec<Arg<'a, Id>> {
        self.args
    }
}

impl<'a, Id: PartialEq> Matches<'a, Id> {
    /// Last value given for `id` (positional or value-taking option).
    pub fn get(&self, id: &Id) -> Option<&str> {
        self.args
            .iter()
            .rev()
            .filter(|a| &a.id == id)
            .find_map(|a| a.value_str())
    }

    /// All values given for `id`, in command-line order.
    pub fn get_all<'s>(&'s self, id: &'s Id) -> impl Iterator<Item = &'s str> + 's {
        self.args
            .iter()
            .filter(move |a| &a.id == id)
            .filter_map(|a| a.value_str())
    }

    /// Whether `id` was matched at all, with or without a value.
    pub fn is_present(&self, id: &Id) -> bool {
        self.args.iter().any(|a| &a.id == id)
    }

    /// How many times `id` was matched (`-vvv` counts three).
    pub fn occurrences(&self, id: &Id) -> usize {
        self.args.iter().filter(|a| &a.id == id).count()
    }
}

impl<'a, Id> IntoIterator for Matches<'a, Id> {
    type Item = Arg<'a, Id>;
    type IntoIter = std::vec::IntoIter<Arg<'a, Id>>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.into_iter()
    }
}

impl<'m, 'a, Id> IntoIterator for &'m Matches<'a, Id> {
    type Item = &'m Arg<'a, Id>;
    type IntoIter = std::slice::Iter<'m, Arg<'a, Id>>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.iter()
    }
}
