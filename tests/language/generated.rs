//! Property tests over generated games

use lantern_language::load_str;
use proptest::prelude::*;

fn corridor(rooms: usize, description: &str) -> String {
    let mut src = String::from("define game <Corridor>\n  start <room0>\nend define\n");
    for i in 0..rooms {
        src.push_str(&format!(
            "define room <room{i}>\n  description <{description}>\n  north <room{}>\nend define\n",
            (i + 1) % rooms
        ));
    }
    src
}

proptest! {
    #[test]
    fn every_room_is_loaded(rooms in 1usize..40, description in "[A-Za-z][A-Za-z ,.]{0,30}") {
        let model = load_str(&corridor(rooms, &description)).unwrap();
        prop_assert_eq!(model.count_of("room"), rooms);
        for i in 0..rooms {
            let room = model.find_by_name("room", &format!("ROOM{i}")).unwrap();
            let expected = format!("<room{}>", (i + 1) % rooms);
            prop_assert_eq!(room.find_line("north"), Some(expected.as_str()));
        }
    }
}
