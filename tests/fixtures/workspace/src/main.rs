use sample::compute;

fn main() {
    let a = compute(1);
    let b = compute(2);
    println!("{}", a + b);
}
