fn main() {
    carepulse_lib::run()
}
