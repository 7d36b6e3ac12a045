use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_cart_items_table::Migration),
            Box::new(m20250301_000002_create_wishlist_items_table::Migration),
            Box::new(m20250301_000003_create_delivery_details_table::Migration),
            Box::new(m20250301_000004_create_orders_table::Migration),
            Box::new(m20250301_000005_create_bank_slips_table::Migration),
        ]
    }
}

mod m20250301_000001_create_cart_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_cart_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductName).string().not_null())
                        .col(ColumnDef::new(CartItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(CartItems::ImageRef).string().not_null())
                        .col(
                            ColumnDef::new(CartItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(CartItems::CreatedBy).string().null())
                        .col(ColumnDef::new(CartItems::UpdatedBy).string().null())
                        .col(ColumnDef::new(CartItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(CartItems::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_owner_id")
                        .table(CartItems::Table)
                        .col(CartItems::OwnerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        OwnerId,
        ProductName,
        UnitPrice,
        ImageRef,
        Quantity,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_wishlist_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_wishlist_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WishlistItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WishlistItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WishlistItems::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(WishlistItems::ProductRef).uuid().not_null())
                        .col(ColumnDef::new(WishlistItems::Name).string().not_null())
                        .col(ColumnDef::new(WishlistItems::Price).decimal().not_null())
                        .col(ColumnDef::new(WishlistItems::ImageRef).string().not_null())
                        .col(ColumnDef::new(WishlistItems::Description).string().null())
                        .col(ColumnDef::new(WishlistItems::Category).string().null())
                        .col(ColumnDef::new(WishlistItems::Priority).string().not_null())
                        .col(
                            ColumnDef::new(WishlistItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One wishlist entry per (owner, product)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_wishlist_owner_product")
                        .table(WishlistItems::Table)
                        .col(WishlistItems::OwnerId)
                        .col(WishlistItems::ProductRef)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WishlistItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WishlistItems {
        Table,
        Id,
        OwnerId,
        ProductRef,
        Name,
        Price,
        ImageRef,
        Description,
        Category,
        Priority,
        CreatedAt,
    }
}

mod m20250301_000003_create_delivery_details_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_delivery_details_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryDetails::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDetails::OwnerId).uuid().not_null())
                        .col(
                            ColumnDef::new(DeliveryDetails::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDetails::Phone).string().not_null())
                        .col(ColumnDef::new(DeliveryDetails::Email).string().not_null())
                        .col(ColumnDef::new(DeliveryDetails::Address).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryDetails::PostalCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDetails::District).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryDetails::DeliveryType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDetails::DeliveryService)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDetails::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(DeliveryDetails::DeliveryCharge)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDetails::TotalAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDetails::Status).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryDetails::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDetails::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_details_owner_id")
                        .table(DeliveryDetails::Table)
                        .col(DeliveryDetails::OwnerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_details_status")
                        .table(DeliveryDetails::Table)
                        .col(DeliveryDetails::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryDetails::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DeliveryDetails {
        Table,
        Id,
        OwnerId,
        CustomerName,
        Phone,
        Email,
        Address,
        PostalCode,
        District,
        DeliveryType,
        DeliveryService,
        Amount,
        DeliveryCharge,
        TotalAmount,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000004_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::DeliveryDetailId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Items).json().not_null())
                        .col(ColumnDef::new(Orders::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Orders::PaymentIntentRef).string().null())
                        .col(ColumnDef::new(Orders::CheckoutSessionRef).string().null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::IdempotencyKey).string().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Duplicate checkout submissions resolve to the original order
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_orders_idempotency_key")
                        .table(Orders::Table)
                        .col(Orders::IdempotencyKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_owner_id")
                        .table(Orders::Table)
                        .col(Orders::OwnerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        OwnerId,
        DeliveryDetailId,
        Items,
        PaymentStatus,
        PaymentIntentRef,
        CheckoutSessionRef,
        TotalAmount,
        Status,
        IdempotencyKey,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000005_create_bank_slips_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_bank_slips_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BankSlips::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BankSlips::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(BankSlips::OrderNumber).string().not_null())
                        .col(ColumnDef::new(BankSlips::FilePath).string().not_null())
                        .col(ColumnDef::new(BankSlips::UploadedAt).timestamp().not_null())
                        .col(ColumnDef::new(BankSlips::Status).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bank_slips_order_number")
                        .table(BankSlips::Table)
                        .col(BankSlips::OrderNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BankSlips::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BankSlips {
        Table,
        Id,
        OrderNumber,
        FilePath,
        UploadedAt,
        Status,
    }
}
