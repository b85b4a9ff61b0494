// Create the Error, ErrorKind, ResultExt, and Result types.
// Result is a typedef of std `Result` with our own `Error`, and the From conversions let `?` work
// for the linked foreign errors. ResultExt adds the `chain_err` trait method.
use error_chain::*;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
        DocOptFailure(::docopt::Error);
        ImageFailure(::image::ImageError);
        LoggerInit(::log::SetLoggerError);
    }

    errors {
        InvalidConfig(reason: String) {
            description("invalid map configuration")
            display("invalid map configuration: {}", reason)
        }
        UnknownModule(id: usize) {
            description("no such module")
            display("no module with id {}", id)
        }
        ImageTooLarge(tiles_across: u64, tiles_along: u64, tile_pixels: u32) {
            description("overview image too large")
            display("an overview of {}x{} tiles at {} pixels per tile is too large to draw",
                    tiles_across, tiles_along, tile_pixels)
        }
    }
}
