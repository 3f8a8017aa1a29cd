fn main() {
    tile_hop::run();
}
