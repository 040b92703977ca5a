mod entity_reference;
mod execution_order;
