fn main() {
    pollster::block_on(tinytrace::run());
}
