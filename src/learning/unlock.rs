use super::CefrLevel;

/// Something that sits in a per-level lesson sequence.
pub trait Unlockable {
    fn level(&self) -> Option<CefrLevel>;
    fn number(&self) -> i32;
    fn completed(&self) -> bool;
    fn set_unlocked(&mut self, unlocked: bool);
}

/// Marks lessons unlocked level by level: the first lesson of a level is
/// open, every later one opens once its predecessor is completed. Items
/// must be sorted by level then number.
pub fn mark_unlocked<T: Unlockable>(items: &mut [T]) {
    let mut current_level = None;
    let mut previous_completed = true;

    for item in items.iter_mut() {
        let level = item.level();
        if level != current_level {
            current_level = level;
            previous_completed = true;
        }

        item.set_unlocked(previous_completed);
        previous_completed = item.completed();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Item {
        level: CefrLevel,
        number: i32,
        completed: bool,
        unlocked: bool,
    }

    impl Unlockable for Item {
        fn level(&self) -> Option<CefrLevel> {
            Some(self.level)
        }
        fn number(&self) -> i32 {
            self.number
        }
        fn completed(&self) -> bool {
            self.completed
        }
        fn set_unlocked(&mut self, unlocked: bool) {
            self.unlocked = unlocked;
        }
    }

    fn item(level: CefrLevel, number: i32, completed: bool) -> Item {
        Item {
            level,
            number,
            completed,
            unlocked: false,
        }
    }

    fn unlocked(items: &[Item]) -> Vec<bool> {
        items.iter().map(|i| i.unlocked).collect()
    }

    #[test]
    fn only_first_lesson_open_for_new_user() {
        let mut items = vec![
            item(CefrLevel::A1, 1, false),
            item(CefrLevel::A1, 2, false),
            item(CefrLevel::A1, 3, false),
        ];
        mark_unlocked(&mut items);
        assert_eq!(unlocked(&items), vec![true, false, false]);
    }

    #[test]
    fn completion_opens_the_next_lesson() {
        let mut items = vec![
            item(CefrLevel::A1, 1, true),
            item(CefrLevel::A1, 2, true),
            item(CefrLevel::A1, 3, false),
            item(CefrLevel::A1, 4, false),
        ];
        mark_unlocked(&mut items);
        assert_eq!(unlocked(&items), vec![true, true, true, false]);
    }

    #[test]
    fn each_level_starts_open() {
        let mut items = vec![
            item(CefrLevel::A1, 1, false),
            item(CefrLevel::A1, 2, false),
            item(CefrLevel::A2, 1, false),
            item(CefrLevel::A2, 2, false),
        ];
        mark_unlocked(&mut items);
        assert_eq!(unlocked(&items), vec![true, false, true, false]);
        assert_eq!(items[2].number(), 1);
    }

    #[test]
    fn empty_is_fine() {
        let mut items: Vec<Item> = vec![];
        mark_unlocked(&mut items);
        assert!(items.is_empty());
    }
}
