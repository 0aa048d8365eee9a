use std::error::Error;
use std::sync::Arc;

use flowpipe::{pipe, ChainItem, Chunk, Fault};
use flowpipe_stages::{BufferWriter, ChunkReader, Console, MapTransform};

fn shout() -> MapTransform {
    MapTransform::new("shout", |chunk: Chunk| {
        Ok::<Chunk, Fault>(chunk.to_ascii_uppercase())
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        // A pipeline that collects into a buffer we can inspect.
        let reader = Arc::new(ChunkReader::new("reader", "sample data\n".as_bytes()));
        let writer = Arc::new(BufferWriter::new("writer"));

        let settled = pipe(vec![
            ChainItem::Stage(reader.clone()),
            ChainItem::stage(shout()),
            ChainItem::Stage(writer.clone()),
        ])
        .await?;

        println!("pipeline of {} stages completed", settled.len());
        println!("buffer holds: {}", String::from_utf8_lossy(&writer.contents()));

        // The same data again, this time straight to the console. The
        // stdout sink never reports termination, yet nothing blocks.
        let reader = Arc::new(ChunkReader::new("reader", "SAMPLE DATA, again\n".as_bytes()));
        pipe(vec![
            ChainItem::Stage(reader),
            ChainItem::stage(Console::stdout()),
        ])
        .await?;

        Ok(())
    })
}
