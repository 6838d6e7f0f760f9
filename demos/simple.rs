/// Run this example with cargo run --example simple
use convenient_zset::SortedSet;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Make a leaderboard
    let mut board = SortedSet::new();
    for (player, points) in &[("ann", 120.0), ("ben", 80.0), ("cat", 95.0), ("dan", 95.0)] {
        board.add(*player, *points).unwrap();
    }

    // print the skiplist
    // warning: this prints every node once per level it occupies
    println!("{:?}", board);

    // New members return true, updates return false
    if board.add("eve", 60.0).unwrap() {
        println!("eve joined");
    }
    if !board.add("ben", 130.0).unwrap() {
        println!("ben moved to {:?}", board.score("ben"));
    }

    // NaN scores are refused
    if let Err(err) = board.add("nan", f64::NAN) {
        println!("refused: {}", err);
    }

    // Ties on score fall back to the member name
    dbg!(board.rank("cat", false), board.rank("dan", false));

    // Top three, highest first
    for rank in 0..3 {
        dbg!(board.get_by_rank(rank, true));
    }

    // Everyone between 90 and 125 points, skipping the first match
    dbg!(board.range_by_score(90.0, 125.0, 1, -1));

    // Pop items
    dbg!(board.pop_max(1));
    dbg!(board.pop_min(1));

    dbg!(board.len(), board.is_empty());

    // Lets iterate over all of them, lowest first
    let all: Vec<_> = board.iter().collect();
    dbg!(all);
}
